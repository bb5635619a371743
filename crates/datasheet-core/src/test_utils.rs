//! Shared record definitions for tests.

pub mod fixtures {
    use std::sync::Arc;

    use crate::container::{Container, ContainerBuilder};
    use crate::descriptor::{EnumDef, NodeDef, RecordDef, ScalarKind, StructDef};

    /// `Id, Content`.
    pub fn basic_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .field("Content", NodeDef::Scalar(ScalarKind::Str))
                .shared(),
        )
        .shared()
    }

    /// `Id, Content` plus an element array of `ElemContent`.
    pub fn array_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .field("Content", NodeDef::Scalar(ScalarKind::Str))
                .shared(),
        )
        .with_elements(
            "Entries",
            StructDef::new()
                .field("ElemContent", NodeDef::Scalar(ScalarKind::Str))
                .shared(),
        )
        .shared()
    }

    /// Nested structs and lists, plus an element array of integer lists.
    pub fn nested_def() -> Arc<RecordDef> {
        let inner = StructDef::new()
            .field("XInt", NodeDef::Scalar(ScalarKind::Int))
            .field("YFloat", NodeDef::Scalar(ScalarKind::Float))
            .field("ZList", NodeDef::list(NodeDef::Scalar(ScalarKind::Str)))
            .shared();
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .field("Struct", NodeDef::Struct(inner.clone()))
                .field("StructList", NodeDef::list(NodeDef::Struct(inner)))
                .shared(),
        )
        .with_elements(
            "Entries",
            StructDef::new()
                .field("IntList", NodeDef::list(NodeDef::Scalar(ScalarKind::Int)))
                .shared(),
        )
        .shared()
    }

    /// Dictionary columns at both the body and element level.
    pub fn dict_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .field("Dict", NodeDef::dict(NodeDef::Scalar(ScalarKind::Float)))
                .shared(),
        )
        .with_elements(
            "Entries",
            StructDef::new()
                .field(
                    "NestedDict",
                    NodeDef::dict(NodeDef::list(NodeDef::Scalar(ScalarKind::Str))),
                )
                .field("Value", NodeDef::Scalar(ScalarKind::Int))
                .shared(),
        )
        .shared()
    }

    /// Every reference shape: direct, self, list, and element-level.
    pub fn refer_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .field("ReferColumn", NodeDef::reference("Tests"))
                .field("SelfReferColumn", NodeDef::reference("Refers"))
                .field("ReferList", NodeDef::list(NodeDef::reference("Tests")))
                .shared(),
        )
        .with_elements(
            "Entries",
            StructDef::new()
                .field("NestedReferColumn", NodeDef::reference("Tests"))
                .shared(),
        )
        .shared()
    }

    /// Enum-keyed record with typed scalar columns.
    pub fn types_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Enum(EnumDef::new("TestIds", &["Alpha", "Bravo", "Charlie"])),
            StructDef::new()
                .field("IntColumn", NodeDef::Scalar(ScalarKind::Int))
                .field("DateColumn", NodeDef::Scalar(ScalarKind::DateTime))
                .shared(),
        )
        .shared()
    }

    /// A string column annotated for asset verification.
    pub fn asset_def() -> Arc<RecordDef> {
        RecordDef::new(
            ScalarKind::Str,
            StructDef::new()
                .annotated("AssetPath", NodeDef::Scalar(ScalarKind::Str), "asset")
                .shared(),
        )
        .shared()
    }

    /// A container declaring one table per fixture definition.
    pub fn container() -> Container {
        let mut builder = ContainerBuilder::new();
        builder.table("Tests", basic_def());
        builder.table("Arrays", array_def());
        builder.table("Types", types_def());
        builder.table("Nested", nested_def());
        builder.table("Dicts", dict_def());
        builder.table("Refers", refer_def());
        builder.table("Assets", asset_def());
        match builder.build() {
            Ok(container) => container,
            Err(err) => panic!("fixture container failed to build: {err}"),
        }
    }
}

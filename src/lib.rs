//! Keyword schema extraction for OpenRadioss/LS-DYNA CFG files.
//!
//! CFG text flows through [`cfg`] (regions and statements) into [`keyword`]
//! schemas, which [`scan`] collects into a [`database::KeywordDatabase`].
//! [`hierarchy`] maps keyword aliases to files and [`merge`] joins keyword
//! corpora from different sources.
pub mod cfg;
pub mod config;
pub mod database;
pub mod export;
pub mod hierarchy;
pub mod keyword;
pub mod merge;
pub mod scan;
pub mod util;

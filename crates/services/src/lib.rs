#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_source;
pub mod error;
pub mod sessions;

pub use app_services::AppServices;
pub use catalog_source::{
    CatalogLocation, CatalogSource, FileCatalogSource, HttpCatalogSource, StaticCatalogSource,
    load_catalog, parse_catalog,
};
pub use error::{AppServicesError, CatalogLoadError, SessionError};
pub use sessions::{GameLoopService, GameSession, Intent, IntentOutcome, RenderModel, Screen};

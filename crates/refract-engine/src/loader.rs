//! Type resolution through a [`TypeLoader`]
//!
//! Loaders are passed explicitly. A process-wide default can be installed
//! once at start-up; nothing is probed from thread-local state.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use refract_sdk::{SdkError, TypeHandle, TypeLoader};
use tracing::{debug, trace};

use crate::error::{ReflectError, ReflectResult};

static DEFAULT_LOADER: OnceCell<Arc<dyn TypeLoader>> = OnceCell::new();

/// Install the process default loader
///
/// Fails if a default has already been installed.
pub fn install_default_loader(loader: Arc<dyn TypeLoader>) -> ReflectResult<()> {
    DEFAULT_LOADER
        .set(loader)
        .map_err(|_| ReflectError::DependencyUnavailable("default type loader already installed".to_string()))
}

/// The process default loader, if one was installed
pub fn default_loader() -> Option<Arc<dyn TypeLoader>> {
    DEFAULT_LOADER.get().cloned()
}

/// Resolve `name` with `loader`
///
/// Tries the primary strategy first; only a not-found result falls back to
/// the secondary strategy. Any other failure propagates unchanged.
pub fn load_type(loader: &dyn TypeLoader, name: &str, initialize: bool) -> ReflectResult<TypeHandle> {
    match loader.find_type(name, initialize) {
        Ok(ty) => {
            debug!(name, initialize, "resolved type");
            Ok(ty)
        }
        Err(SdkError::TypeNotFound(_)) => {
            trace!(name, "primary lookup missed, trying secondary strategy");
            let ty = loader.load_type(name)?;
            debug!(name, "resolved type via secondary strategy");
            Ok(ty)
        }
        Err(err) => Err(err.into()),
    }
}

/// Explicit carrier for an optional context loader
#[derive(Clone, Default)]
pub struct LoaderContext {
    loader: Option<Arc<dyn TypeLoader>>,
}

impl LoaderContext {
    /// Context with no loader; resolution uses the process default
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying `loader`
    pub fn with_loader(loader: Arc<dyn TypeLoader>) -> Self {
        Self { loader: Some(loader) }
    }

    /// Context loader if present, else the process default
    pub fn resolve(&self) -> ReflectResult<Arc<dyn TypeLoader>> {
        self.loader
            .clone()
            .or_else(default_loader)
            .ok_or_else(|| ReflectError::DependencyUnavailable("no type loader available".to_string()))
    }
}

/// Resolve `name` using the context loader or the process default
pub fn load_type_in(ctx: &LoaderContext, name: &str, initialize: bool) -> ReflectResult<TypeHandle> {
    let loader = ctx.resolve()?;
    load_type(loader.as_ref(), name, initialize)
}

//! Session knowledge about which models a credential can use.

use crate::classifier::model_listed;
use remark_core::{ModelCatalog, ModelId, Provider};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};

#[derive(Debug, Default)]
struct Known {
    lists: HashMap<Provider, Arc<[String]>>,
    confirmed: HashSet<ModelId>,
}

/// Model lists and confirmed models for the current session.
///
/// A model is confirmed once a call to it has succeeded or it appeared in a
/// fetched model list. Lists are cached per provider when caching is enabled;
/// otherwise every lookup goes back to the catalog.
pub struct ModelDirectory {
    catalog: Option<Arc<dyn ModelCatalog>>,
    cache_lists: bool,
    known: Mutex<Known>,
}

impl std::fmt::Debug for ModelDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDirectory")
            .field("has_catalog", &self.catalog.is_some())
            .field("cache_lists", &self.cache_lists)
            .finish_non_exhaustive()
    }
}

impl ModelDirectory {
    /// Directory backed by `catalog`, if the host can list models.
    pub fn new(catalog: Option<Arc<dyn ModelCatalog>>, cache_lists: bool) -> Self {
        Self {
            catalog,
            cache_lists,
            known: Mutex::new(Known::default()),
        }
    }

    fn known(&self) -> MutexGuard<'_, Known> {
        self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `model` is known to exist for this credential.
    pub fn is_confirmed(&self, model: &ModelId) -> bool {
        self.known().confirmed.contains(model)
    }

    /// Record that `model` exists.
    pub fn confirm(&self, model: &ModelId) {
        self.known().confirmed.insert(model.clone());
    }

    /// Models available for `provider`.
    ///
    /// Returns `None` when there is no catalog, the provider cannot list
    /// models, or the listing failed.
    #[instrument(skip(self))]
    pub async fn available(&self, provider: Provider) -> Option<Arc<[String]>> {
        if self.cache_lists {
            let cached = self.known().lists.get(&provider).cloned();
            if let Some(list) = cached {
                debug!(models = list.len(), "Using cached model list");
                return Some(list);
            }
        }

        let catalog = self.catalog.as_ref()?;
        let list: Arc<[String]> = match catalog.list_models(provider).await {
            Ok(models) => models.into(),
            Err(e) if e.is_unsupported() => {
                debug!("Provider cannot list models");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Model listing failed");
                return None;
            }
        };
        debug!(models = list.len(), "Fetched model list");

        if self.cache_lists {
            self.known().lists.insert(provider, Arc::clone(&list));
        }
        Some(list)
    }

    /// Remember a list obtained elsewhere, e.g. by a validation probe.
    pub fn remember(&self, provider: Provider, models: &[String]) {
        if self.cache_lists {
            self.known().lists.insert(provider, models.into());
        }
    }

    /// Mark `model` as confirmed if `available` contains it.
    pub fn confirm_if_listed(&self, model: &ModelId, available: &[String]) -> bool {
        let listed = model_listed(available, model.model());
        if listed {
            self.confirm(model);
        }
        listed
    }

    /// Drop cached lists and confirmations, for one provider or all of them.
    ///
    /// Call after the credential changes.
    pub fn forget(&self, provider: Option<Provider>) {
        let mut known = self.known();
        match provider {
            Some(provider) => {
                known.lists.remove(&provider);
                known.confirmed.retain(|model| model.provider() != provider);
            }
            None => {
                known.lists.clear();
                known.confirmed.clear();
            }
        }
    }
}

//! # Resource Synchronizer
//!
//! One [`ResourceSync`] per backend collection. It owns the collection cache
//! and its error slot, and is the only writer of either.
//!
//! ## Load Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   load #1 ──seq=1──► request ─────────────────────────► late answer    │
//! │                         ▲ abort                            │            │
//! │   load #2 ──seq=2──► ───┘ request ──► answer               │            │
//! │                                         │                  │            │
//! │                                         ▼                  ▼            │
//! │                               seq == current?      seq == current?      │
//! │                               yes: replace cache   no: discard          │
//! │                               generation += 1      (not an error)       │
//! │                                                                         │
//! │   Mutations capture `generation` before sending. If a load replaced   │
//! │   the collection meanwhile, their completion leaves the cache alone.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Optimistic Mutations
//! ```text
//! update_optimistic / remove_optimistic
//!   apply locally ──► request ──┬── ok  ──► keep (replace with server record)
//!                               └── err ──► roll back entry at its position
//! ```

use std::sync::Arc;

use almacen_core::normalize::SaleForm;
use almacen_core::sale::SalePayload;
use almacen_core::validation::validate_search_query;
use almacen_core::wire::WireSaleStatus;
use almacen_core::{Sale, SaleStatus};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::endpoint::{unwrap_envelope, unwrap_record, Endpoint};
use crate::error::{SyncError, SyncResult};
use crate::transport::{abort_pair, check_status, AbortHandle, AbortSignal, HttpTransport, Request};

/// What a successful create/update/delete does to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationMode {
    /// Apply the server-confirmed record locally.
    #[default]
    Merge,
    /// Refetch the whole collection.
    Reload,
}

struct CollectionState<T> {
    items: Vec<T>,
    error: Option<String>,
    loading: bool,
    /// Sequence of the authoritative load.
    load_seq: u64,
    /// Bumped whenever the collection is wholly replaced.
    generation: u64,
    abort: Option<AbortHandle>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            loading: false,
            load_seq: 0,
            generation: 0,
            abort: None,
        }
    }
}

impl<T: Endpoint> CollectionState<T> {
    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

/// Cache and backend operations for one collection.
///
/// Cloning is cheap; clones share the cache.
pub struct ResourceSync<T: Endpoint> {
    transport: Arc<dyn HttpTransport>,
    state: Arc<RwLock<CollectionState<T>>>,
}

impl<T: Endpoint> Clone for ResourceSync<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Endpoint> ResourceSync<T> {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(RwLock::new(CollectionState::default())),
        }
    }

    pub fn collection(&self) -> &'static str {
        T::PATH
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Copy of the cached collection.
    pub async fn snapshot(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    /// Message in the error slot, if any.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    /// Cancels the in-flight load and empties the cache.
    pub async fn discard(&self) {
        let mut state = self.state.write().await;
        if let Some(abort) = state.abort.take() {
            abort.abort();
        }
        state.load_seq += 1;
        state.generation += 1;
        state.loading = false;
        state.items.clear();
        state.error = None;
        debug!(collection = T::PATH, "Collection discarded");
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Fetches the collection and replaces the cache.
    ///
    /// A newer `load` or a `discard` supersedes this one; the superseded call
    /// returns `Err(Cancelled)` and leaves the cache and error slot alone.
    pub async fn load(&self) -> SyncResult<()> {
        let (handle, signal) = abort_pair();
        let seq = {
            let mut state = self.state.write().await;
            if let Some(previous) = state.abort.replace(handle) {
                previous.abort();
                debug!(collection = T::PATH, seq = state.load_seq, "Cancelled previous load");
            }
            state.load_seq += 1;
            state.loading = true;
            state.load_seq
        };

        debug!(collection = T::PATH, seq, "Loading collection");
        let result = self.fetch_all(signal).await;

        let mut state = self.state.write().await;
        if state.load_seq != seq {
            debug!(collection = T::PATH, seq, current = state.load_seq, "Discarding stale load result");
            return Err(SyncError::Cancelled);
        }

        state.loading = false;
        state.abort = None;

        match result {
            Ok(items) => {
                info!(collection = T::PATH, seq, count = items.len(), "Collection loaded");
                state.items = items;
                state.generation += 1;
                state.error = None;
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(collection = T::PATH, seq, error = %e, "Load failed, keeping previous cache");
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    async fn fetch_all(&self, abort: AbortSignal) -> SyncResult<Vec<T>> {
        let body = self.send(Request::get(T::PATH), abort).await?;
        Ok(unwrap_envelope(body, T::ENVELOPE).into_iter().map(T::from_value).collect())
    }

    // =========================================================================
    // Single Record
    // =========================================================================

    /// Fetches one record and upserts it in the cache.
    pub async fn get(&self, id: &str) -> SyncResult<T> {
        let body = match self.send(Request::get(T::item_path(id)), AbortSignal::never()).await {
            Ok(body) => body,
            Err(e) => return Err(self.record_error(e).await),
        };

        let record = match self.decode_record(body, &T::item_path(id)) {
            Ok(record) => record,
            Err(e) => return Err(self.record_error(e).await),
        };
        let mut state = self.state.write().await;
        match state.position(record.id()) {
            Some(pos) => state.items[pos] = record.clone(),
            None if !record.id().is_empty() => state.items.insert(0, record.clone()),
            None => {}
        }
        Ok(record)
    }

    /// Searches the backend. A 404 means nothing matched.
    ///
    /// The cache is not touched.
    pub async fn search(&self, query: &str) -> SyncResult<Vec<T>> {
        let query = match validate_search_query(query) {
            Ok(q) => q,
            Err(e) => return Err(self.record_error(e.into()).await),
        };

        match self.send(Request::get(T::search_path(&query)), AbortSignal::never()).await {
            Ok(body) => Ok(unwrap_envelope(body, T::ENVELOPE).into_iter().map(T::from_value).collect()),
            Err(SyncError::NotFound { .. }) => {
                debug!(collection = T::PATH, query = %query, "Search matched nothing");
                Ok(Vec::new())
            }
            Err(e) => Err(self.record_error(e).await),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a record. `Merge` puts the confirmed record at the head.
    ///
    /// A success without a record in the body (204, `null`) returns the
    /// submitted record without an id and reloads the collection.
    pub async fn create(&self, form: &T::Form, mode: MutationMode) -> SyncResult<T> {
        self.validate(form).await?;
        let generation = self.generation().await;

        let body = serde_json::to_value(T::to_backend(form))?;
        let response = match self.send(Request::post(T::PATH, body), AbortSignal::never()).await {
            Ok(response) => response,
            Err(e) => return Err(self.record_error(e).await),
        };

        let record = self.confirmed_or_submitted(response, form, T::PATH);
        let merged = self
            .settle(generation, mode, record.id(), |items| items.insert(0, record.clone()))
            .await;
        debug!(collection = T::PATH, id = record.id(), merged, "Record created");
        Ok(record)
    }

    /// Updates a record. `Merge` replaces the cached entry with the same id.
    ///
    /// A success without a record in the body keeps the submitted values.
    pub async fn update(&self, id: &str, form: &T::Form, mode: MutationMode) -> SyncResult<T> {
        self.validate(form).await?;
        let generation = self.generation().await;

        let path = T::item_path(id);
        let body = serde_json::to_value(T::to_backend(form))?;
        let response = match self.send(Request::put(path.clone(), body), AbortSignal::never()).await {
            Ok(response) => response,
            Err(e) => return Err(self.record_error(e).await),
        };

        let mut record = self.confirmed_or_submitted(response, form, &path);
        if record.id().is_empty() {
            record.set_id(id);
        }

        self.settle(generation, mode, record.id(), |items| {
            if let Some(pos) = items.iter().position(|item| item.id() == id) {
                items[pos] = record.clone();
            }
        })
        .await;
        Ok(record)
    }

    /// Deletes a record. `Merge` drops the cached entry.
    pub async fn remove(&self, id: &str, mode: MutationMode) -> SyncResult<()> {
        let generation = self.generation().await;

        if let Err(e) = self.send(Request::delete(T::item_path(id)), AbortSignal::never()).await {
            return Err(self.record_error(e).await);
        }

        self.settle(generation, mode, id, |items| items.retain(|item| item.id() != id))
            .await;
        Ok(())
    }

    /// Applies the update locally first; rolls back if the backend refuses.
    pub async fn update_optimistic(&self, id: &str, form: &T::Form) -> SyncResult<T> {
        self.validate(form).await?;

        let mut local = T::to_canonical(&T::to_backend(form));
        local.set_id(id);

        let (previous, generation) = {
            let mut state = self.state.write().await;
            let Some(pos) = state.position(id) else {
                return Err(SyncError::NotFound { path: T::item_path(id) });
            };
            let previous = std::mem::replace(&mut state.items[pos], local.clone());
            (previous, state.generation)
        };

        let path = T::item_path(id);
        let body = serde_json::to_value(T::to_backend(form))?;
        let result = self.send(Request::put(path.clone(), body), AbortSignal::never()).await;

        match result {
            Ok(response) => {
                let confirmed = unwrap_record(response).map(T::from_value).filter(|r| !r.id().is_empty());
                let kept = confirmed.unwrap_or(local);

                let mut state = self.state.write().await;
                if state.generation == generation {
                    if let Some(pos) = state.position(id) {
                        state.items[pos] = kept.clone();
                    }
                }
                Ok(kept)
            }
            Err(e) => {
                {
                    let mut state = self.state.write().await;
                    if state.generation == generation {
                        if let Some(pos) = state.position(id) {
                            state.items[pos] = previous;
                        }
                        warn!(collection = T::PATH, id, "Rolled back optimistic update");
                    }
                }
                Err(self.record_error(e).await)
            }
        }
    }

    /// Removes locally first; reinserts at the same position on failure.
    pub async fn remove_optimistic(&self, id: &str) -> SyncResult<()> {
        let (pos, previous, generation) = {
            let mut state = self.state.write().await;
            let Some(pos) = state.position(id) else {
                return Err(SyncError::NotFound { path: T::item_path(id) });
            };
            let previous = state.items.remove(pos);
            (pos, previous, state.generation)
        };

        if let Err(e) = self.send(Request::delete(T::item_path(id)), AbortSignal::never()).await {
            {
                let mut state = self.state.write().await;
                if state.generation == generation {
                    let pos = pos.min(state.items.len());
                    state.items.insert(pos, previous);
                    warn!(collection = T::PATH, id, "Rolled back optimistic delete");
                }
            }
            return Err(self.record_error(e).await);
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn send(&self, request: Request, abort: AbortSignal) -> SyncResult<Value> {
        let path = request.path.clone();
        let response = self.transport.send(request, abort).await?;
        check_status(response, &path)
    }

    async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    async fn validate(&self, form: &T::Form) -> SyncResult<()> {
        match T::validate_form(form) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.record_error(e.into()).await),
        }
    }

    fn decode_record(&self, body: Value, path: &str) -> SyncResult<T> {
        unwrap_record(body)
            .map(T::from_value)
            .ok_or_else(|| SyncError::Decode(format!("{} did not return a record", path)))
    }

    /// The record in a 2xx mutation reply, or the submitted form as the
    /// backend will have stored it.
    fn confirmed_or_submitted(&self, body: Value, form: &T::Form, path: &str) -> T {
        match unwrap_record(body) {
            Some(value) => T::from_value(value),
            None => {
                debug!(collection = T::PATH, path, "Mutation reply carried no record, using submitted form");
                T::to_canonical(&T::to_backend(form))
            }
        }
    }

    /// Applies a confirmed mutation. Returns whether the cache was touched.
    ///
    /// `Reload` mode, and a confirmed record without an id, refetch instead.
    async fn settle<F>(&self, generation: u64, mode: MutationMode, id: &str, apply: F) -> bool
    where
        F: FnOnce(&mut Vec<T>),
    {
        if mode == MutationMode::Merge && !id.is_empty() {
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!(collection = T::PATH, id, "Collection replaced during mutation, cache left as is");
                return false;
            }
            apply(&mut state.items);
            return true;
        }

        if let Err(e) = self.load().await {
            debug!(collection = T::PATH, error = %e, "Reload after mutation did not apply");
        }
        false
    }

    /// Puts the error in the slot (unless it is a cancellation) and returns it.
    async fn record_error(&self, error: SyncError) -> SyncError {
        if !error.is_cancelled() {
            warn!(collection = T::PATH, error = %error, "Request failed");
            self.state.write().await.error = Some(error.user_message());
        }
        error
    }
}

// =============================================================================
// Sales
// =============================================================================

impl ResourceSync<Sale> {
    /// Submits a built sale.
    pub async fn checkout(&self, payload: SalePayload, mode: MutationMode) -> SyncResult<Sale> {
        let mismatches = payload.subtotal_mismatches();
        if !mismatches.is_empty() {
            warn!(lines = ?mismatches, "Sale carries subtotals that differ from quantity × price");
        }
        self.create(&SaleForm::from(payload), mode).await
    }

    /// `PUT /sales/{id}/status`.
    pub async fn set_status(&self, id: &str, status: SaleStatus) -> SyncResult<()> {
        let body = serde_json::to_value(WireSaleStatus {
            estado_venta: status.as_wire().to_string(),
        })?;
        let path = format!("{}/status", Sale::item_path(id));

        if let Err(e) = self.send(Request::put(path, body), AbortSignal::never()).await {
            return Err(self.record_error(e).await);
        }

        let mut state = self.state.write().await;
        if let Some(pos) = state.position(id) {
            state.items[pos].status = status;
        }
        info!(id, status = status.as_wire(), "Sale status changed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, Response};
    use almacen_core::normalize::{CategoryForm, ClientForm};
    use almacen_core::sale::{build_sale_payload, CartLine};
    use almacen_core::{Category, Client, Money, Normalize, PaymentMethod, Product};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Step {
        Reply(u16, Value),
        /// Answers after a delay and ignores the abort signal.
        Late(Duration, u16, Value),
        /// Waits for the abort signal.
        Hang,
        Fail(SyncError),
    }

    #[derive(Default)]
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: Request, mut abort: AbortSignal) -> SyncResult<Response> {
            self.requests.lock().unwrap().push(request);
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Reply(status, body)) => Ok(Response::new(status, body)),
                Some(Step::Late(delay, status, body)) => {
                    tokio::time::sleep(delay).await;
                    Ok(Response::new(status, body))
                }
                Some(Step::Hang) => {
                    abort.aborted().await;
                    Err(SyncError::Cancelled)
                }
                Some(Step::Fail(e)) => Err(e),
                None => Err(SyncError::Transport("script exhausted".into())),
            }
        }
    }

    fn collection<T: Endpoint>(transport: &Arc<ScriptedTransport>) -> ResourceSync<T> {
        ResourceSync::new(transport.clone())
    }

    fn categories_body() -> Value {
        json!({
            "categorias": [
                {"id_categoria": 1, "nombre_categoria": "Bebidas", "estado": true},
                {"id_categoria": 2, "nombre_categoria": "Lácteos", "estado": "inactivo"}
            ]
        })
    }

    fn category_form(name: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_string(),
            active: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_replaces_cache() {
        let transport = ScriptedTransport::new(vec![Step::Reply(200, categories_body())]);
        let categories = collection::<Category>(&transport);

        categories.load().await.unwrap();
        let items = categories.snapshot().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "CAT-001");
        assert!(!items[1].active);
        assert!(!categories.is_loading().await);
        assert_eq!(transport.requests()[0].path, "categories");
    }

    #[tokio::test]
    async fn test_unknown_envelope_is_empty() {
        let transport = ScriptedTransport::new(vec![Step::Reply(200, json!({"mensaje": "ok"}))]);
        let products = collection::<Product>(&transport);

        products.load().await.unwrap();
        assert!(products.snapshot().await.is_empty());
        assert!(products.error().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cache() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Fail(SyncError::Transport("connection reset".into())),
        ]);
        let categories = collection::<Category>(&transport);

        categories.load().await.unwrap();
        assert!(categories.load().await.is_err());

        assert_eq!(categories.snapshot().await.len(), 2);
        assert_eq!(categories.error().await.as_deref(), Some(crate::error::GENERIC_FAILURE));

        categories.clear_error().await;
        assert!(categories.error().await.is_none());
    }

    #[tokio::test]
    async fn test_second_load_wins_over_late_first() {
        let transport = ScriptedTransport::new(vec![
            Step::Late(
                Duration::from_millis(60),
                200,
                json!([{"id_categoria": 9, "nombre_categoria": "Vieja"}]),
            ),
            Step::Reply(200, json!([{"id_categoria": 3, "nombre_categoria": "Nueva"}])),
        ]);
        let categories = collection::<Category>(&transport);

        let first = categories.clone();
        let first = tokio::spawn(async move { first.load().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        categories.load().await.unwrap();
        let first = first.await.unwrap();

        assert!(first.unwrap_err().is_cancelled());
        let items = categories.snapshot().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Nueva");
        assert!(categories.error().await.is_none());
    }

    #[tokio::test]
    async fn test_superseded_load_is_aborted() {
        let transport = ScriptedTransport::new(vec![Step::Hang, Step::Reply(200, categories_body())]);
        let categories = collection::<Category>(&transport);

        let first = categories.clone();
        let first = tokio::spawn(async move { first.load().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(categories.is_loading().await);

        categories.load().await.unwrap();
        let first = tokio::time::timeout(Duration::from_secs(1), first).await.unwrap().unwrap();

        assert!(first.unwrap_err().is_cancelled());
        assert_eq!(categories.snapshot().await.len(), 2);
        assert!(categories.error().await.is_none());
    }

    #[tokio::test]
    async fn test_discard_drops_in_flight_load() {
        let transport = ScriptedTransport::new(vec![Step::Reply(200, categories_body()), Step::Hang]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let pending = categories.clone();
        let pending = tokio::spawn(async move { pending.load().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        categories.discard().await;

        assert!(pending.await.unwrap().unwrap_err().is_cancelled());
        assert!(categories.snapshot().await.is_empty());
        assert!(!categories.is_loading().await);
    }

    #[tokio::test]
    async fn test_create_merges_at_head_with_backend_names() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Reply(
                201,
                json!({"data": {"id_categoria": 3, "nombre_categoria": "Limpieza", "estado": true}}),
            ),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let created = categories
            .create(&category_form("Limpieza"), MutationMode::Merge)
            .await
            .unwrap();

        assert_eq!(created.id, "CAT-003");
        assert_eq!(categories.snapshot().await[0].id, "CAT-003");

        let sent = transport.requests()[1].clone();
        assert_eq!(sent.method, Method::Post);
        let body = sent.body.unwrap();
        assert_eq!(body["nombre_categoria"], "Limpieza");
        assert!(body.get("name").is_none());
    }

    #[tokio::test]
    async fn test_create_reload_mode_refetches() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(201, json!({"id_categoria": 3, "nombre_categoria": "Limpieza"})),
            Step::Reply(200, categories_body()),
        ]);
        let categories = collection::<Category>(&transport);

        categories
            .create(&category_form("Limpieza"), MutationMode::Reload)
            .await
            .unwrap();

        assert_eq!(categories.snapshot().await.len(), 2);
        assert_eq!(transport.requests()[1].method, Method::Get);
    }

    #[tokio::test]
    async fn test_rejected_create_surfaces_message() {
        let transport = ScriptedTransport::new(vec![Step::Reply(
            409,
            json!({"message": "Ya existe una categoría con ese nombre"}),
        )]);
        let categories = collection::<Category>(&transport);

        let err = categories
            .create(&category_form("Bebidas"), MutationMode::Merge)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Rejected { status: 409, .. }));
        assert_eq!(
            categories.error().await.as_deref(),
            Some("Ya existe una categoría con ese nombre")
        );
        assert!(categories.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let transport = ScriptedTransport::new(vec![]);
        let categories = collection::<Category>(&transport);

        let err = categories.create(&category_form("  "), MutationMode::Merge).await.unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert!(transport.requests().is_empty());
        assert!(categories.error().await.is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_by_id() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Reply(200, json!({"id_categoria": 2, "nombre_categoria": "Lácteos y huevos", "estado": true})),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let mut form = categories.snapshot().await[1].to_form();
        form.name = "Lácteos y huevos".into();
        categories.update("CAT-002", &form, MutationMode::Merge).await.unwrap();

        let items = categories.snapshot().await;
        assert_eq!(items[1].name, "Lácteos y huevos");
        assert!(items[1].active);
        assert_eq!(transport.requests()[1].path, "categories/2");
    }

    #[tokio::test]
    async fn test_update_without_body_reloads() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Reply(204, Value::Null),
            Step::Reply(200, json!([{"id_categoria": 2, "nombre_categoria": "Lácteos y huevos"}])),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let mut form = categories.snapshot().await[1].to_form();
        form.name = "Lácteos y huevos".into();
        let updated = categories.update("CAT-002", &form, MutationMode::Reload).await.unwrap();

        assert_eq!(updated.id, "CAT-002");
        assert_eq!(updated.name, "Lácteos y huevos");
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].method, Method::Get);
        assert_eq!(categories.snapshot().await.len(), 1);
        assert!(categories.error().await.is_none());
    }

    #[tokio::test]
    async fn test_update_without_body_merges_submitted_values() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Reply(200, Value::Null),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let mut form = categories.snapshot().await[1].to_form();
        form.name = "Quesos".into();
        categories.update("CAT-002", &form, MutationMode::Merge).await.unwrap();

        let items = categories.snapshot().await;
        assert_eq!(items[1].id, "CAT-002");
        assert_eq!(items[1].name, "Quesos");
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_create_without_body_reloads() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(204, Value::Null),
            Step::Reply(200, json!([{"id_categoria": 3, "nombre_categoria": "Limpieza"}])),
        ]);
        let categories = collection::<Category>(&transport);

        let created = categories
            .create(&category_form("Limpieza"), MutationMode::Merge)
            .await
            .unwrap();

        assert_eq!(created.name, "Limpieza");
        assert_eq!(transport.requests()[1].method, Method::Get);
        assert_eq!(categories.snapshot().await[0].id, "CAT-003");
        assert!(categories.error().await.is_none());
    }

    #[tokio::test]
    async fn test_mutation_after_reload_leaves_new_collection() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Late(
                Duration::from_millis(40),
                201,
                json!({"id_categoria": 8, "nombre_categoria": "Congelados"}),
            ),
            Step::Reply(200, json!([{"id_categoria": 5, "nombre_categoria": "Panadería"}])),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let creating = categories.clone();
        let creating = tokio::spawn(async move {
            creating
                .create(&category_form("Congelados"), MutationMode::Merge)
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        categories.load().await.unwrap();

        assert_eq!(creating.await.unwrap().unwrap().id, "CAT-008");
        let items = categories.snapshot().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Panadería");
    }

    #[tokio::test]
    async fn test_remove_merge_and_failure() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Reply(400, json!({"error": "La categoría tiene productos"})),
            Step::Reply(204, Value::Null),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        assert!(categories.remove("CAT-001", MutationMode::Merge).await.is_err());
        assert_eq!(categories.snapshot().await.len(), 2);
        assert_eq!(categories.error().await.as_deref(), Some("La categoría tiene productos"));

        categories.remove("CAT-001", MutationMode::Merge).await.unwrap();
        let items = categories.snapshot().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "CAT-002");
    }

    #[tokio::test]
    async fn test_optimistic_update_rolls_back() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Fail(SyncError::Timeout(15)),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let mut form = categories.snapshot().await[0].to_form();
        form.name = "Gaseosas".into();
        assert!(categories.update_optimistic("CAT-001", &form).await.is_err());

        let items = categories.snapshot().await;
        assert_eq!(items[0].name, "Bebidas");
        assert_eq!(categories.error().await.as_deref(), Some(crate::error::GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn test_optimistic_update_confirmed() {
        let transport = ScriptedTransport::new(vec![Step::Reply(200, categories_body()), Step::Reply(204, Value::Null)]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        let mut form = categories.snapshot().await[0].to_form();
        form.name = "Gaseosas".into();
        let kept = categories.update_optimistic("CAT-001", &form).await.unwrap();

        assert_eq!(kept.id, "CAT-001");
        assert_eq!(categories.snapshot().await[0].name, "Gaseosas");
    }

    #[tokio::test]
    async fn test_optimistic_remove_restores_position() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(200, categories_body()),
            Step::Fail(SyncError::Transport("down".into())),
        ]);
        let categories = collection::<Category>(&transport);
        categories.load().await.unwrap();

        assert!(categories.remove_optimistic("CAT-001").await.is_err());
        let ids: Vec<String> = categories.snapshot().await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["CAT-001", "CAT-002"]);
    }

    #[tokio::test]
    async fn test_optimistic_on_unknown_id() {
        let transport = ScriptedTransport::new(vec![]);
        let categories = collection::<Category>(&transport);
        let err = categories.remove_optimistic("CAT-404").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_search_not_found_is_empty() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(404, json!({"message": "Sin resultados"})),
            Step::Reply(200, json!({"clientes": [{"id_cliente": 4, "nombre_cliente": "Ana"}]})),
            Step::Reply(500, Value::Null),
        ]);
        let clients = collection::<Client>(&transport);

        assert!(clients.search("zz").await.unwrap().is_empty());
        assert!(clients.error().await.is_none());

        let found = clients.search(" Ana ").await.unwrap();
        assert_eq!(found[0].name, "Ana");
        assert_eq!(transport.requests()[1].path, "clients/search/Ana");

        assert!(clients.search("Ana").await.is_err());
        assert!(clients.error().await.is_some());
    }

    #[tokio::test]
    async fn test_get_upserts() {
        let transport = ScriptedTransport::new(vec![Step::Reply(
            200,
            json!({"id_cliente": 7, "nombre_cliente": "Luis", "estado_cliente": "activo"}),
        )]);
        let clients = collection::<Client>(&transport);

        let client = clients.get("7").await.unwrap();
        assert_eq!(client.name, "Luis");
        assert_eq!(clients.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_without_record_sets_error() {
        let transport = ScriptedTransport::new(vec![Step::Reply(200, json!(["no", "record"]))]);
        let clients = collection::<Client>(&transport);

        let err = clients.get("7").await.unwrap_err();

        assert!(matches!(err, SyncError::Decode(_)));
        assert_eq!(clients.error().await, Some(err.user_message()));
        assert!(clients.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_client_create_requires_document() {
        let transport = ScriptedTransport::new(vec![]);
        let clients = collection::<Client>(&transport);
        let form = ClientForm {
            name: "Marta".into(),
            ..Default::default()
        };
        assert!(clients.create(&form, MutationMode::Merge).await.is_err());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_and_status() {
        let transport = ScriptedTransport::new(vec![
            Step::Reply(201, json!({"id_venta": 31, "total": 5500, "metodo_pago": "efectivo"})),
            Step::Reply(200, json!({"message": "ok"})),
        ]);
        let sales = collection::<Sale>(&transport);

        let lines = vec![
            CartLine {
                id: Some("10".into()),
                name: "Arroz".into(),
                quantity: 2,
                unit_price: Money::from_major(1000.0),
                ..Default::default()
            },
            CartLine {
                id: Some("11".into()),
                name: "Aceite".into(),
                quantity: 1,
                unit_price: Money::from_major(3500.0),
                ..Default::default()
            },
        ];
        let payload = build_sale_payload(None, &lines, "efectivo").unwrap();
        let sale = sales.checkout(payload, MutationMode::Merge).await.unwrap();

        assert_eq!(sale.id, "31");
        assert_eq!(sale.payment_method, PaymentMethod::Cash);

        let sent = transport.requests()[0].body.clone().unwrap();
        assert_eq!(sent["total"], 5500.0);
        assert_eq!(sent["metodo_pago"], "efectivo");
        assert_eq!(sent["detalles"][0]["subtotal"], 2000.0);

        sales.set_status("31", SaleStatus::Voided).await.unwrap();
        assert_eq!(sales.snapshot().await[0].status, SaleStatus::Voided);

        let status = &transport.requests()[1];
        assert_eq!(status.path, "sales/31/status");
        assert_eq!(status.body.as_ref().unwrap()["estado_venta"], "anulada");
    }
}

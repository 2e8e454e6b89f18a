//! IndexedDB storage implementation for WebAssembly.
//!
//! Records are stored as JSON strings in one object store, keyed by
//! record key.

use super::{BoxFuture, PersistedCanvas, STORE_NAME, Storage, StorageError, StorageResult};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

const DB_NAME: &str = "LightDrawDB";
const DB_VERSION: u32 = 1;

/// IndexedDB-based storage for WebAssembly.
///
/// Not Send/Sync: IndexedDB handles live on the browser's main thread.
pub struct IndexedDbStorage {
    /// Cached database connection.
    db: Rc<RefCell<Option<IdbDatabase>>>,
}

impl IndexedDbStorage {
    /// The connection is established lazily by `open` or the first access.
    pub fn new() -> Self {
        Self {
            db: Rc::new(RefCell::new(None)),
        }
    }

    async fn get_db(&self) -> StorageResult<IdbDatabase> {
        if let Some(db) = self.db.borrow().as_ref() {
            return Ok(db.clone());
        }

        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;
        let idb_factory = window
            .indexed_db()
            .map_err(|e| StorageError::Unavailable(format!("IndexedDB error: {e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("IndexedDB not available".to_string()))?;

        let open_request = idb_factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(|e| StorageError::Unavailable(format!("Failed to open DB: {e:?}")))?;

        let onupgrade = Closure::once(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
            let db = event
                .target()
                .and_then(|target| target.dyn_into::<IdbRequest>().ok())
                .and_then(|request| request.result().ok())
                .and_then(|result| result.dyn_into::<IdbDatabase>().ok());
            let Some(db) = db else {
                log::error!("IndexedDB upgrade without a database handle");
                return;
            };
            if !db.object_store_names().contains(STORE_NAME) {
                if let Err(e) = db.create_object_store(STORE_NAME) {
                    log::error!("Failed to create object store: {e:?}");
                }
            }
        }) as Box<dyn FnOnce(_)>);

        open_request.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db = await_idb_request::<IdbDatabase>(&open_request)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *self.db.borrow_mut() = Some(db.clone());
        Ok(db)
    }

    fn get_store(&self, db: &IdbDatabase, mode: IdbTransactionMode) -> StorageResult<IdbObjectStore> {
        let transaction = db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(|e| StorageError::Io(format!("Transaction error: {e:?}")))?;
        transaction
            .object_store(STORE_NAME)
            .map_err(|e| StorageError::Io(format!("Store error: {e:?}")))
    }
}

impl Default for IndexedDbStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for IndexedDbStorage {
    fn open(&self) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move { self.get_db().await.map(|_| ()) })
    }

    fn save(&self, key: &str, record: &PersistedCanvas) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = match record.to_json() {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;
            let request = store
                .put_with_key(&JsValue::from_str(&json), &JsValue::from_str(&key))
                .map_err(|e| StorageError::WriteFailed(format!("Put error: {e:?}")))?;
            await_idb_request::<JsValue>(&request)
                .await
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<PersistedCanvas>>> {
        let key = key.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readonly)?;
            let request = store
                .get(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Io(format!("Get error: {e:?}")))?;
            let result = await_idb_request::<JsValue>(&request).await?;

            if result.is_undefined() || result.is_null() {
                return Ok(None);
            }
            let json = result
                .as_string()
                .ok_or_else(|| StorageError::Serialization("Invalid stored data".to_string()))?;
            PersistedCanvas::from_json(&json).map(Some)
        })
    }

    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();

        Box::pin(async move {
            let db = self.get_db().await?;
            let store = self.get_store(&db, IdbTransactionMode::Readwrite)?;
            let request = store
                .delete(&JsValue::from_str(&key))
                .map_err(|e| StorageError::Io(format!("Delete error: {e:?}")))?;
            await_idb_request::<JsValue>(&request).await?;
            Ok(())
        })
    }
}

/// Await an IndexedDB request by bridging its callbacks to a Promise.
async fn await_idb_request<T: JsCast>(request: &IdbRequest) -> StorageResult<T> {
    use wasm_bindgen_futures::JsFuture;

    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let reject_success = reject.clone();
        let onsuccess = Closure::once(Box::new(move |event: web_sys::Event| {
            let result = event
                .target()
                .and_then(|target| target.dyn_into::<IdbRequest>().ok())
                .map(|request| request.result());
            let _ = match result {
                Some(Ok(value)) => resolve.call1(&JsValue::NULL, &value),
                _ => reject_success.call1(&JsValue::NULL, &JsValue::from_str("IndexedDB result unavailable")),
            };
        }) as Box<dyn FnOnce(_)>);

        let onerror = Closure::once(Box::new(move |_event: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IndexedDB request failed"));
        }) as Box<dyn FnOnce(_)>);

        request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        request.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        onsuccess.forget();
        onerror.forget();
    });

    JsFuture::from(promise)
        .await
        .map_err(|e| StorageError::Io(format!("IndexedDB request failed: {e:?}")))?
        .dyn_into::<T>()
        .map_err(|_| StorageError::Serialization("Type conversion failed".to_string()))
}

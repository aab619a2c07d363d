//! Low-level IndexedDB helpers using web-sys
//!
//! Wraps the callback-based IndexedDB API into Rust futures using
//! `wasm_bindgen_futures::JsFuture` and `js_sys::Promise`.

use js_sys::Promise;
use std::cell::RefCell;
use std::rc::Rc;
use offdex_core::DB;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    IdbCursorWithValue, IdbDatabase, IdbFactory, IdbObjectStore, IdbOpenDbRequest, IdbRequest,
    IdbTransaction, IdbTransactionMode,
};

use crate::error::{describe, IndexedDbError, Result};

/// Schema version. Bumping it re-runs the upgrade handler, which only ever
/// creates the object store if it is missing.
const DB_VERSION: u32 = 1;

/// Type alias for upgrade closure to reduce complexity
type UpgradeClosure = Rc<RefCell<Option<Closure<dyn FnMut(web_sys::IdbVersionChangeEvent)>>>>;

/// Get the global IndexedDB factory.
pub fn idb_factory() -> Result<IdbFactory> {
    let global = js_sys::global();

    let idb: JsValue = js_sys::Reflect::get(&global, &"indexedDB".into())
        .map_err(|_| IndexedDbError::NotAvailable("no indexedDB on global".into()))?;

    if idb.is_undefined() || idb.is_null() {
        return Err(IndexedDbError::NotAvailable(
            "indexedDB is null/undefined".into(),
        ));
    }

    idb.dyn_into::<IdbFactory>()
        .map_err(|_| IndexedDbError::NotAvailable("indexedDB is not IdbFactory".into()))
}

/// Convert an IdbRequest into a JS Promise that resolves with the request's result.
///
/// Handlers are installed fresh on every call, so a cursor request can be
/// awaited once per `continue()`.
fn request_to_promise(req: &IdbRequest) -> Promise {
    let req_success = req.clone();
    let req_error = req.clone();

    Promise::new(&mut move |resolve, reject| {
        // Store closures in Rc<RefCell> to manage their lifetime without leaking
        type ClosurePair = (
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
        );
        let closures: Rc<RefCell<Option<ClosurePair>>> = Rc::new(RefCell::new(None));

        let req_s = req_success.clone();
        let closures_for_success = closures.clone();
        let on_success = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let result = req_s.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::UNDEFINED, &result);
            *closures_for_success.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        let req_e = req_error.clone();
        let closures_for_error = closures.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let msg = req_e
                .error()
                .ok()
                .flatten()
                .map(|e| JsValue::from(e.message()))
                .unwrap_or_else(|| JsValue::from_str("unknown IDB error"));
            let _ = reject.call1(&JsValue::UNDEFINED, &msg);
            *closures_for_error.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        req_success.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        req_error.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        // Keep both closures alive until one fires
        *closures.borrow_mut() = Some((on_success, on_error));
    })
}

/// Convert an IdbTransaction completion into a JS Promise.
///
/// Rejects on both `error` and `abort`.
fn transaction_to_promise(tx: &IdbTransaction) -> Promise {
    let tx = tx.clone();

    Promise::new(&mut move |resolve, reject| {
        type ClosureTriple = (
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
            Closure<dyn FnMut(web_sys::Event)>,
        );
        let closures: Rc<RefCell<Option<ClosureTriple>>> = Rc::new(RefCell::new(None));

        let closures_for_complete = closures.clone();
        let on_complete = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let _ = resolve.call0(&JsValue::UNDEFINED);
            *closures_for_complete.borrow_mut() = None;
        }) as Box<dyn FnMut(web_sys::Event)>);

        let fail = {
            let tx = tx.clone();
            let closures = closures.clone();
            move |fallback: &str| {
                let msg = tx
                    .error()
                    .map(|e| JsValue::from(e.message()))
                    .unwrap_or_else(|| JsValue::from_str(fallback));
                let _ = reject.call1(&JsValue::UNDEFINED, &msg);
                *closures.borrow_mut() = None;
            }
        };
        let fail = Rc::new(fail);

        let fail_on_error = fail.clone();
        let on_error = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            fail_on_error("transaction error");
        }) as Box<dyn FnMut(web_sys::Event)>);

        let on_abort = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            fail("transaction aborted");
        }) as Box<dyn FnMut(web_sys::Event)>);

        tx.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        tx.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        tx.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

        *closures.borrow_mut() = Some((on_complete, on_error, on_abort));
    })
}

/// Create `store_name` keyed by `key_path` unless it already exists.
fn ensure_object_store(db: &IdbDatabase, store_name: &str, key_path: &str) -> Result<()> {
    if db.object_store_names().contains(store_name) {
        return Ok(());
    }

    let params = web_sys::IdbObjectStoreParameters::new();
    js_sys::Reflect::set(&params, &"keyPath".into(), &key_path.into())
        .map_err(|e| IndexedDbError::Open(format!("set keyPath: {}", describe(&e))))?;

    db.create_object_store_with_optional_parameters(store_name, &params)
        .map_err(|e| IndexedDbError::Open(format!("create object store: {}", describe(&e))))?;
    Ok(())
}

/// Open (or create) a database whose `store_name` object store is keyed by
/// `key_path`.
pub async fn open_database(db_name: &str, store_name: &str, key_path: &str) -> Result<IdbDatabase> {
    let factory = idb_factory()?;

    let open_req: IdbOpenDbRequest = factory
        .open_with_u32(db_name, DB_VERSION)
        .map_err(|e| IndexedDbError::Open(describe(&e)))?;

    // Store upgrade closure to manage its lifetime without leaking
    let upgrade_closure: UpgradeClosure = Rc::new(RefCell::new(None));
    let upgrade_closure_for_drop = upgrade_closure.clone();

    let store_name_owned = store_name.to_string();
    let key_path_owned = key_path.to_string();
    let on_upgrade = Closure::wrap(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
        let db = event
            .target()
            .map(|target| target.unchecked_into::<IdbOpenDbRequest>())
            .and_then(|req| req.result().ok())
            .map(|result| result.unchecked_into::<IdbDatabase>());

        match db {
            Some(db) => {
                // A failure here aborts the versionchange transaction, which
                // surfaces as an error on the open request below.
                if let Err(e) = ensure_object_store(&db, &store_name_owned, &key_path_owned) {
                    warn!("{} upgrade of {} failed: {}", DB, store_name_owned, e);
                }
            }
            None => warn!("{} upgradeneeded fired without a database", DB),
        }
    }) as Box<dyn FnMut(web_sys::IdbVersionChangeEvent)>);

    open_req.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
    *upgrade_closure.borrow_mut() = Some(on_upgrade);

    let open_promise = request_to_promise(open_req.unchecked_ref());
    let result = wasm_bindgen_futures::JsFuture::from(open_promise)
        .await
        .map_err(|e| IndexedDbError::Open(describe(&e)))?;

    // Clean up upgrade closure now that open is complete
    *upgrade_closure_for_drop.borrow_mut() = None;

    let db = result
        .dyn_into::<IdbDatabase>()
        .map_err(|_| IndexedDbError::Open("result is not IdbDatabase".into()))?;

    // The database may predate this configuration (created at the same
    // version by another layout); no upgrade fires in that case.
    if let Err(e) = check_layout(&db, db_name, store_name, key_path) {
        db.close();
        return Err(e);
    }

    Ok(db)
}

/// Verify that `store_name` exists and is keyed in-line by `key_path`.
fn check_layout(db: &IdbDatabase, db_name: &str, store_name: &str, key_path: &str) -> Result<()> {
    if !db.object_store_names().contains(store_name) {
        return Err(IndexedDbError::Open(format!(
            "object store '{}' missing from database '{}'",
            store_name, db_name
        )));
    }

    // The transaction holds no requests and completes on its own.
    let (_tx, store) = begin_transaction(db, store_name, IdbTransactionMode::Readonly)?;
    let actual = store
        .key_path()
        .map_err(|e| IndexedDbError::Open(format!("read keyPath: {}", describe(&e))))?;

    match actual.as_string() {
        Some(actual) if actual == key_path => Ok(()),
        Some(actual) => Err(IndexedDbError::Open(format!(
            "object store '{}' in '{}' is keyed by '{}', expected '{}'",
            store_name, db_name, actual, key_path
        ))),
        None => Err(IndexedDbError::Open(format!(
            "object store '{}' in '{}' has keyPath {}, expected '{}'",
            store_name,
            db_name,
            describe(&actual),
            key_path
        ))),
    }
}

/// Start a transaction on `store_name`.
pub fn begin_transaction(
    db: &IdbDatabase,
    store_name: &str,
    mode: IdbTransactionMode,
) -> Result<(IdbTransaction, IdbObjectStore)> {
    let tx = db
        .transaction_with_str_and_mode(store_name, mode)
        .map_err(|e| IndexedDbError::Transaction(describe(&e)))?;
    let store = tx
        .object_store(store_name)
        .map_err(|e| IndexedDbError::Request(describe(&e)))?;
    Ok((tx, store))
}

/// Await an IdbRequest, resolving to its result JsValue.
pub async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    let promise = request_to_promise(req);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Request(describe(&e)))
}

/// Await an IdbTransaction to complete.
pub async fn await_transaction(tx: &IdbTransaction) -> Result<()> {
    let promise = transaction_to_promise(tx);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Transaction(describe(&e)))?;
    Ok(())
}

/// Walk `store` with a forward cursor, calling `visit` on each position.
///
/// `visit` may delete the current record through the cursor (in a readwrite
/// transaction). Stops at the end of the store or on the first error.
pub async fn for_each_cursor<F>(store: &IdbObjectStore, mut visit: F) -> Result<()>
where
    F: FnMut(&IdbCursorWithValue) -> Result<()>,
{
    let req = store
        .open_cursor()
        .map_err(|e| IndexedDbError::Request(format!("openCursor: {}", describe(&e))))?;

    loop {
        let result = await_request(&req).await?;
        if result.is_null() || result.is_undefined() {
            return Ok(());
        }

        let cursor = result
            .dyn_into::<IdbCursorWithValue>()
            .map_err(|_| IndexedDbError::Request("cursor result is not IdbCursorWithValue".into()))?;
        visit(&cursor)?;
        cursor
            .continue_()
            .map_err(|e| IndexedDbError::Request(format!("continue: {}", describe(&e))))?;
    }
}

/// Delete an IndexedDB database by name.
pub async fn delete_database(db_name: &str) -> Result<()> {
    let factory = idb_factory()?;
    let req = factory
        .delete_database(db_name)
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", describe(&e))))?;
    let promise = request_to_promise(req.unchecked_ref());
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::Open(format!("delete db: {}", describe(&e))))?;
    Ok(())
}

//! BarTender automation engine (Windows only)
//!
//! Drives `BarTender.Application` through COM late binding (`IDispatch`).
//! Each document session starts its own hidden application instance on the
//! calling thread and quits it when the session ends.

use crate::engine::{LabelDocument, LabelEngine};
use crate::error::{LabelError, LabelResult};
use std::path::Path;
use std::ptr::null_mut;
use tracing::{debug, info, instrument, warn};
use windows::Win32::System::Com::{
    CLSCTX_LOCAL_SERVER, CLSIDFromProgID, COINIT_APARTMENTTHREADED, CoCreateInstance,
    CoInitializeEx, CoUninitialize, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
    DISPATCH_PROPERTYPUT, DISPPARAMS, IDispatch,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;
use windows::core::{BSTR, GUID, HSTRING, IUnknown, Interface, PCWSTR, VARIANT, w};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// BtSaveOptions.btDoNotSaveChanges
const BT_DO_NOT_SAVE_CHANGES: i32 = 1;

/// Label engine backed by the BarTender desktop application
#[derive(Debug, Clone, Default)]
pub struct BarTenderEngine {
    visible: bool,
}

impl BarTenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the BarTender window while printing (debugging only)
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

impl LabelEngine for BarTenderEngine {
    type Document = BarTenderDocument;

    #[instrument(skip(self), fields(template = %template.display()))]
    fn open(&self, template: &Path) -> LabelResult<Self::Document> {
        let apartment = ComApartment::enter()?;

        let app: IDispatch = unsafe {
            let clsid = CLSIDFromProgID(w!("BarTender.Application"))
                .map_err(|e| LabelError::Open(format!("BarTender is not installed: {}", e)))?;
            CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER)
                .map_err(|e| LabelError::Open(format!("Failed to start BarTender: {}", e)))?
        };
        info!("BarTender application started");

        // From here on the guard quits the application on every exit path
        let mut session = BarTenderDocument {
            doc: None,
            app: Some(app),
            _apartment: apartment,
        };

        let app = session.app()?;
        put(app, "Visible", VARIANT::from(self.visible))
            .map_err(|e| LabelError::Open(format!("Visible: {}", e)))?;

        let documents = get_dispatch(app, "Documents", Vec::new())
            .map_err(|e| LabelError::Open(format!("Documents: {}", e)))?;
        let path = BSTR::from(template.to_string_lossy().as_ref());
        let doc = call(&documents, "Open", vec![VARIANT::from(path)])
            .and_then(|v| to_dispatch(&v))
            .map_err(|e| LabelError::Open(format!("{}: {}", template.display(), e)))?;

        session.doc = Some(doc);
        debug!("Template document opened");
        Ok(session)
    }
}

/// An open BarTender format plus the application that owns it
pub struct BarTenderDocument {
    doc: Option<IDispatch>,
    app: Option<IDispatch>,
    // Dropped last: COM must stay initialized while the interfaces are released
    _apartment: ComApartment,
}

impl BarTenderDocument {
    fn app(&self) -> LabelResult<&IDispatch> {
        self.app
            .as_ref()
            .ok_or_else(|| LabelError::Engine("Application already released".to_string()))
    }

    fn doc(&self) -> LabelResult<&IDispatch> {
        self.doc
            .as_ref()
            .ok_or_else(|| LabelError::Engine("Document already closed".to_string()))
    }

    /// Close without saving, then quit. Safe to call more than once.
    fn shutdown(&mut self) -> LabelResult<()> {
        let mut first_error = None;

        if let Some(doc) = self.doc.take()
            && let Err(e) = call(&doc, "Close", vec![VARIANT::from(BT_DO_NOT_SAVE_CHANGES)])
        {
            first_error.get_or_insert(LabelError::Close(format!("Close: {}", e)));
        }

        if let Some(app) = self.app.take() {
            if let Err(e) = call(&app, "Quit", vec![VARIANT::from(BT_DO_NOT_SAVE_CHANGES)]) {
                first_error.get_or_insert(LabelError::Close(format!("Quit: {}", e)));
            } else {
                debug!("BarTender application released");
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl LabelDocument for BarTenderDocument {
    fn set_field(&mut self, name: &str, value: &str) -> LabelResult<()> {
        let doc = self.doc()?;
        let variable = get_dispatch(doc, "Variables", vec![VARIANT::from(BSTR::from(name))])
            .map_err(|_| LabelError::FieldNotFound(name.to_string()))?;
        put(&variable, "Value", VARIANT::from(BSTR::from(value))).map_err(|e| {
            LabelError::FieldRejected {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn print(&mut self) -> LabelResult<()> {
        let doc = self.doc()?;
        // PrintOut(ShowStatusWindow, ShowPrintDialog)
        call(doc, "PrintOut", vec![VARIANT::from(false), VARIANT::from(false)])
            .map_err(|e| LabelError::Print(e.to_string()))?;
        info!("Print job submitted to BarTender");
        Ok(())
    }

    fn close(mut self) -> LabelResult<()> {
        self.shutdown()
    }
}

impl Drop for BarTenderDocument {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Failed to release BarTender session");
        }
    }
}

/// Single-threaded COM apartment for the current thread
struct ComApartment;

impl ComApartment {
    fn enter() -> LabelResult<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| LabelError::Engine(format!("CoInitializeEx failed: {}", e)))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

// ========== IDispatch helpers ==========

fn dispid(obj: &IDispatch, name: &str) -> windows::core::Result<i32> {
    let wide = HSTRING::from(name);
    let names = [PCWSTR(wide.as_ptr())];
    let mut id = 0i32;
    unsafe {
        obj.GetIDsOfNames(
            &GUID::zeroed(),
            names.as_ptr(),
            1,
            LOCALE_USER_DEFAULT,
            &mut id,
        )?;
    }
    Ok(id)
}

fn invoke(
    obj: &IDispatch,
    name: &str,
    flags: DISPATCH_FLAGS,
    mut args: Vec<VARIANT>,
) -> windows::core::Result<VARIANT> {
    let id = dispid(obj, name)?;

    // IDispatch expects arguments in reverse order
    args.reverse();
    let mut named_put = DISPID_PROPERTYPUT;
    let is_put = flags == DISPATCH_PROPERTYPUT;

    let params = DISPPARAMS {
        rgvarg: if args.is_empty() {
            null_mut()
        } else {
            args.as_mut_ptr()
        },
        rgdispidNamedArgs: if is_put { &mut named_put } else { null_mut() },
        cArgs: args.len() as u32,
        cNamedArgs: u32::from(is_put),
    };

    let mut result = VARIANT::default();
    unsafe {
        obj.Invoke(
            id,
            &GUID::zeroed(),
            LOCALE_USER_DEFAULT,
            flags,
            &params,
            Some(&mut result),
            None,
            None,
        )?;
    }
    Ok(result)
}

fn call(obj: &IDispatch, name: &str, args: Vec<VARIANT>) -> windows::core::Result<VARIANT> {
    invoke(obj, name, DISPATCH_METHOD, args)
}

fn put(obj: &IDispatch, name: &str, value: VARIANT) -> windows::core::Result<()> {
    invoke(obj, name, DISPATCH_PROPERTYPUT, vec![value]).map(|_| ())
}

fn get_dispatch(
    obj: &IDispatch,
    name: &str,
    args: Vec<VARIANT>,
) -> windows::core::Result<IDispatch> {
    let value = invoke(obj, name, DISPATCH_METHOD | DISPATCH_PROPERTYGET, args)?;
    to_dispatch(&value)
}

fn to_dispatch(value: &VARIANT) -> windows::core::Result<IDispatch> {
    IUnknown::try_from(value)?.cast()
}

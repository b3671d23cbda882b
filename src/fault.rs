//! Handler faults and the class hierarchy catchers filter on.
//!
//! Every fault carries a [`FaultClass`]. Classes form a tree rooted at
//! [`ERROR`]; a catcher registered for a class receives faults of that class
//! and of every class below it.
//!
//! Declare your own classes as `static` items:
//!
//! ```
//! use arrowroute::fault::{self, Fault, FaultClass};
//!
//! static NOT_REGISTERED: FaultClass = FaultClass::new("not-registered", &fault::HTTP);
//!
//! let fault = Fault::new(&NOT_REGISTERED, "unknown provider");
//! assert!(fault.class().is_a(&fault::HTTP));
//! assert!(fault.class().is_a(&fault::ERROR));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::Arc;

use http::StatusCode;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Root class. A catcher without an explicit class filters on this one.
pub static ERROR: FaultClass = FaultClass::root("error");
/// A fault that maps onto a specific HTTP status, see [`Fault::http`].
pub static HTTP: FaultClass = FaultClass::new("http", &ERROR);
/// The request body could not be decoded.
pub static CODEC: FaultClass = FaultClass::new("codec", &ERROR);
/// A storage or network operation failed, see [`Fault::io`].
pub static IO: FaultClass = FaultClass::new("io", &ERROR);
/// The request chain was cancelled. Never offered to catchers; only the
/// pipeline itself raises it.
pub(crate) static CANCELLED: FaultClass = FaultClass::new("cancelled", &ERROR);

/// A node in the fault class tree.
///
/// Classes compare by identity: two `static` items with the same name and
/// parent are still distinct classes.
#[derive(Debug)]
pub struct FaultClass {
    name: &'static str,
    parent: Option<&'static FaultClass>,
}

impl FaultClass {
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    pub const fn new(name: &'static str, parent: &'static FaultClass) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static FaultClass> {
        self.parent
    }

    /// Whether `self` is `ancestor` or lies below it.
    pub fn is_a(&self, ancestor: &FaultClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == ancestor {
                return true;
            }
            current = class.parent;
        }
        false
    }

    /// Number of ancestors. A class is always deeper than any of its ancestors.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(class) = current {
            depth += 1;
            current = class.parent;
        }
        depth
    }
}

impl PartialEq for FaultClass {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for FaultClass {}

impl Hash for FaultClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self, state);
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An error raised by a validator, route or catcher handler.
///
/// Any `std::error::Error + Send + Sync` converts into a `Fault` of class
/// [`ERROR`], so `?` works inside handlers. Cloning is cheap.
#[derive(Clone)]
pub struct Fault {
    class: &'static FaultClass,
    status: Option<StatusCode>,
    error: Arc<dyn StdError + Send + Sync>,
}

impl Fault {
    pub fn new(class: &'static FaultClass, error: impl Into<BoxError>) -> Self {
        Self {
            class,
            status: None,
            error: Arc::from(error.into()),
        }
    }

    /// A fault of class [`HTTP`] that asks to be answered with `status`.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(&HTTP, message.into())
        }
    }

    pub fn codec(error: impl Into<BoxError>) -> Self {
        Self::new(&CODEC, error)
    }

    /// A fault of class [`IO`].
    pub fn io(error: std::io::Error) -> Self {
        Self::new(&IO, error)
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(&CANCELLED, "request cancelled")
    }

    pub fn class(&self) -> &'static FaultClass {
        self.class
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        ptr::eq(self.class, &CANCELLED)
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref()
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(&ERROR, error)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.error)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("class", &self.class.name)
            .field("status", &self.status)
            .field("error", &self.error)
            .finish()
    }
}

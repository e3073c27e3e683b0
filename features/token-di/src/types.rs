use std::{
    any::{type_name, Any},
    fmt::Debug,
    hash::{Hash, Hasher},
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

/// Error type returned by factories, consumers and disposers
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Key `0` belongs to the self-reference token, user tokens start at `1`
pub(crate) const CONTAINER_KEY_ID: u64 = 0;
static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(CONTAINER_KEY_ID + 1);

/// Identity of a token
///
/// Two keys are equal only if they were handed out by the same allocation,
/// the display name takes no part in equality.
#[derive(Clone)]
pub struct TokenKey {
    id: u64,
    name: Rc<str>,
}
impl TokenKey {
    pub(crate) fn allocate(name: &str) -> Self {
        TokenKey {
            id: NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed),
            name: Rc::from(name),
        }
    }

    pub(crate) fn reserved(id: u64, name: &str) -> Self {
        TokenKey {
            id,
            name: Rc::from(name),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_container(&self) -> bool {
        self.id == CONTAINER_KEY_ID
    }
}
impl PartialEq for TokenKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TokenKey {}
impl Hash for TokenKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]#{}", self.name, self.id)
    }
}
impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.name)
    }
}

/// A resolved value with its type erased
#[derive(Clone)]
pub struct Instance {
    pub type_name: &'static str,
    value: Rc<dyn Any>,
}
impl Instance {
    pub(crate) fn new<T: 'static>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    pub(crate) fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        Instance {
            type_name: type_name::<T>(),
            value,
        }
    }

    /// Returns the shared value, or the name of the stored type on mismatch
    pub fn downcast<T: 'static>(&self) -> Result<Rc<T>, &'static str> {
        match self.value.clone().downcast::<T>() {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.type_name),
        }
    }

    /// Borrowing variant of [`Instance::downcast`]
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T, &'static str> {
        self.value.downcast_ref::<T>().ok_or(self.type_name)
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

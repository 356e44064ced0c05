use std::fmt;
use std::sync::Arc;

/// Optional callback shared between threads.
///
/// `F` is usually a `dyn Fn(..) + Send + Sync` signature; cloning only bumps
/// the reference count.
pub enum SharedFn<F: ?Sized + Send + Sync + 'static> {
    None,
    Some(Arc<F>),
}

impl<F: ?Sized + Send + Sync + 'static> SharedFn<F> {
    pub fn new(f: Arc<F>) -> Self {
        SharedFn::Some(f)
    }

    pub fn is_some(&self) -> bool {
        matches!(self, SharedFn::Some(_))
    }

    pub fn get(&self) -> Option<&F> {
        match self {
            SharedFn::None => None,
            SharedFn::Some(f) => Some(f.as_ref()),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Clone for SharedFn<F> {
    fn clone(&self) -> Self {
        match self {
            SharedFn::None => SharedFn::None,
            SharedFn::Some(f) => SharedFn::Some(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for SharedFn<F> {
    fn default() -> Self {
        SharedFn::None
    }
}

impl<F: ?Sized + Send + Sync + 'static> From<Arc<F>> for SharedFn<F> {
    fn from(f: Arc<F>) -> Self {
        SharedFn::Some(f)
    }
}

impl<F: ?Sized + Send + Sync + 'static> fmt::Debug for SharedFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedFn::None => write!(f, "SharedFn::None"),
            SharedFn::Some(_) => write!(f, "SharedFn::Some(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn clones_share_the_callback() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let callback: SharedFn<dyn Fn(u32) + Send + Sync> = SharedFn::new(Arc::new(move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        }));

        let copy = callback.clone();
        callback.get().unwrap()(2);
        copy.get().unwrap()(3);

        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn default_is_none() {
        let callback: SharedFn<dyn Fn() + Send + Sync> = SharedFn::default();
        assert!(!callback.is_some());
        assert!(callback.get().is_none());
        assert_eq!(format!("{:?}", callback), "SharedFn::None");
    }
}

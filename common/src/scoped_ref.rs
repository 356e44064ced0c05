/// Runs a closure when dropped, on every exit path of the owning scope.
#[derive(Debug)]
pub struct ScopeRef<F>
where
    F: FnOnce(),
{
    on_drop: Option<F>,
}

impl<F> ScopeRef<F>
where
    F: FnOnce(),
{
    pub fn new(on_drop: F) -> Self {
        Self {
            on_drop: Some(on_drop),
        }
    }
}

impl<F> Drop for ScopeRef<F>
where
    F: FnOnce(),
{
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeRef;
    use std::cell::Cell;

    fn fallible(fail: bool, released: &Cell<u32>) -> Result<u32, &'static str> {
        let _guard = ScopeRef::new(|| released.set(released.get() + 1));
        if fail {
            return Err("failed");
        }
        Ok(7)
    }

    #[test]
    fn runs_on_success_and_on_error() {
        let released = Cell::new(0);

        assert_eq!(fallible(false, &released), Ok(7));
        assert_eq!(released.get(), 1);

        assert_eq!(fallible(true, &released), Err("failed"));
        assert_eq!(released.get(), 2);
    }
}

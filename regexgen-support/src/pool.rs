/*!
A process-wide object pool for generated matchers' per-call scratch space
(`spec.md` §5: "Generated code may declare a pattern-scoped process-wide
object pool for (a) the backtrack stack array and (b) the capture
checkpoint array").

Grounded on the pooling idiom `spec.md` §9 names directly ("a lock-free
stack or a thread-local cache; lifetime is the program's"); implemented here
as a `Mutex`-backed stack rather than a lock-free one, matching the
trade-off the teacher's own `util::pool::Pool` makes (a short critical
section around a `Vec::pop`/`push` beats the complexity of a lock-free
treiber stack for objects this cheap to contend over).
*/

use std::sync::Mutex;

/// A pool of reusable `T`s. `T` must know how to produce an empty instance
/// (`Default`) and how to clear itself of any borrowed/retained state before
/// going back in the pool (`spec.md` §5: "Pooled objects are cleared of
/// references before return to avoid retaining input-byte views").
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
}

/// A pooled `T`, returned to its pool when dropped.
pub struct Checkout<'a, T: Resettable> {
    pool: &'a Pool<T>,
    value: Option<T>,
}

/// Types that can be cleared back to a pool-ready state without being
/// reallocated.
pub trait Resettable {
    fn reset(&mut self);
}

impl<T: Default> Pool<T> {
    pub fn new() -> Pool<T> {
        Pool { free: Mutex::new(Vec::new()) }
    }
}

impl<T: Default> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool::new()
    }
}

impl<T: Default + Resettable> Pool<T> {
    /// Acquires a `T`, either reused from the pool or freshly defaulted.
    /// Release happens automatically when the returned [`Checkout`] drops,
    /// on every exit path (`spec.md` §5: "release is guaranteed on every
    /// exit path").
    pub fn get(&self) -> Checkout<'_, T> {
        let value = self.free.lock().unwrap().pop().unwrap_or_default();
        Checkout { pool: self, value: Some(value) }
    }
}

impl<T: Resettable> std::ops::Deref for Checkout<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.value.as_ref().expect("value taken only on drop")
    }
}

impl<T: Resettable> std::ops::DerefMut for Checkout<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("value taken only on drop")
    }
}

impl<T: Resettable> Drop for Checkout<'_, T> {
    fn drop(&mut self) {
        if let Some(mut value) = self.value.take() {
            value.reset();
            self.pool.free.lock().unwrap().push(value);
        }
    }
}

impl<T> Resettable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_out_values_are_reused_after_release() {
        let pool: Pool<Vec<u8>> = Pool::new();
        {
            let mut v = pool.get();
            v.extend_from_slice(&[1, 2, 3]);
        }
        let v = pool.get();
        assert!(v.is_empty(), "pooled vec should have been cleared on return");
    }
}

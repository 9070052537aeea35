pub trait Succ: Sized {
    /// The next value, or `None` on overflow
    #[must_use]
    fn succ(self) -> Option<Self>;
}

macro_rules! impl_succ {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Succ for $ty {
                #[inline]
                fn succ(self) -> Option<Self> { self.checked_add(1) }
            }
        )*
    };
}

impl_succ!(u32, i32, usize);

/// Sequential id allocator bounded by an inclusive maximum
#[derive(Debug, Clone, Copy)]
pub struct Free<T> {
    next: Option<T>,
    max: T,
}

impl<T: Copy + Ord + Succ> Free<T> {
    #[inline]
    pub fn new(start: T, max: T) -> Self {
        Self {
            next: Some(start),
            max,
        }
    }

    #[must_use]
    pub fn fresh(&mut self) -> Option<T> {
        let id = self.next.filter(|n| *n <= self.max)?;
        self.next = id.succ();
        Some(id)
    }

    #[inline]
    pub fn max(&self) -> T { self.max }
}

#[cfg(test)]
mod test {
    use super::Free;

    #[test]
    fn exhausts_at_max() {
        let mut free = Free::new(0_u32, 2);
        assert_eq!(free.fresh(), Some(0));
        assert_eq!(free.fresh(), Some(1));
        assert_eq!(free.fresh(), Some(2));
        assert_eq!(free.fresh(), None);
        assert_eq!(free.fresh(), None);
    }

    #[test]
    fn no_wraparound() {
        let mut free = Free::new(i32::MAX - 1, i32::MAX);
        assert_eq!(free.fresh(), Some(i32::MAX - 1));
        assert_eq!(free.fresh(), Some(i32::MAX));
        assert_eq!(free.fresh(), None);
    }
}

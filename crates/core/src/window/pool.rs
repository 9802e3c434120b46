/// Free list of render targets.
///
/// Released targets keep whatever they last showed; callers rebind before
/// reuse.
#[derive(Debug)]
pub struct RenderTargetPool<T> {
    free: Vec<T>,
    created: usize,
}

impl<T> RenderTargetPool<T> {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            created: 0,
        }
    }

    /// A released target if there is one, otherwise a fresh one from `make`.
    pub fn allocate(&mut self, make: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(target) => target,
            None => {
                self.created += 1;
                make()
            }
        }
    }

    pub fn release(&mut self, target: T) {
        self.free.push(target);
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Targets constructed over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<T> Default for RenderTargetPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

use crate::core::utils::vector::dot;

/// One curvature pair: the position difference `s`, the gradient difference `y`, and
/// `rho = 1 / (s·y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub s: Vec<f64>,
    pub y: Vec<f64>,
    pub rho: f64,
}

impl Correction {
    pub fn new(s: Vec<f64>, y: Vec<f64>) -> Self {
        let rho = 1.0 / dot(&s, &y);
        Self { s, y, rho }
    }

    #[inline]
    pub fn curvature(&self) -> f64 {
        dot(&self.s, &self.y)
    }

    /// The well-conditioned diagonal inverse-Hessian estimate `s·y / y·y`.
    #[inline]
    pub fn inverse_hessian_scale(&self) -> f64 {
        self.curvature() / dot(&self.y, &self.y)
    }
}

/// Fixed-capacity ring buffer of the most recent [`Correction`]s.
///
/// Slots are filled in order `0, 1, .., M-1` and then reused cyclically, so the
/// `k`-th pushed correction (counting from one) lands in slot `(k - 1) mod M`.
#[derive(Debug, Clone)]
pub struct History {
    slots: Vec<Correction>,
    capacity: usize,
    next: usize,
}

impl History {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Stores `correction`, overwriting the oldest entry once the buffer is full.
    pub fn push(&mut self, correction: Correction) {
        if self.slots.len() < self.capacity {
            self.slots.push(correction);
        } else {
            self.slots[self.next] = correction;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.next = 0;
    }

    /// Slot written by the most recent [`push`](Self::push), if any.
    pub fn latest_slot(&self) -> Option<usize> {
        if self.slots.is_empty() {
            None
        } else {
            Some((self.next + self.capacity - 1) % self.capacity)
        }
    }

    pub fn latest(&self) -> Option<&Correction> {
        self.latest_slot().map(|slot| &self.slots[slot])
    }

    /// Corrections from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Correction> {
        // Before the buffer wraps `next == len`, so `older` is empty.
        let (newer, older) = self.slots.split_at(self.next.min(self.slots.len()));
        older.iter().chain(newer.iter())
    }
}

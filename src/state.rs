/// Cell state understood by the dispersal rules.
///
/// Dispersal only cares about occupancy, but grids may carry richer numeric
/// state. Any state that can report how occupied it is and can be merged
/// with another state works.
pub trait State: Copy + PartialEq + Send + Sync {
    /// The unoccupied state.
    fn empty() -> Self;

    /// The state written into a freshly invaded cell.
    fn occupied() -> Self;

    /// Multiplier applied to kernel weights when this cell is a source of pressure.
    fn occupancy(self) -> f64;

    #[inline]
    fn is_occupied(self) -> bool {
        self.occupancy() > 0.0
    }

    /// Combine two writes to the same cell within one step.
    ///
    /// Must be associative and commutative so that the order in which
    /// invasions arrive never matters.
    fn merge(self, other: Self) -> Self;
}

impl State for bool {
    #[inline]
    fn empty() -> Self {
        false
    }

    #[inline]
    fn occupied() -> Self {
        true
    }

    #[inline]
    fn occupancy(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        self | other
    }
}

macro_rules! impl_integer_state {
    ($($t:ty),*) => {
        $(
            impl State for $t {
                #[inline]
                fn empty() -> Self {
                    0
                }

                #[inline]
                fn occupied() -> Self {
                    1
                }

                #[inline]
                fn occupancy(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn merge(self, other: Self) -> Self {
                    self.max(other)
                }
            }
        )*
    };
}

macro_rules! impl_float_state {
    ($($t:ty),*) => {
        $(
            impl State for $t {
                #[inline]
                fn empty() -> Self {
                    0.0
                }

                #[inline]
                fn occupied() -> Self {
                    1.0
                }

                #[inline]
                fn occupancy(self) -> f64 {
                    // NaN counts as empty.
                    if self > 0.0 {
                        self as f64
                    } else {
                        0.0
                    }
                }

                #[inline]
                fn merge(self, other: Self) -> Self {
                    self.max(other)
                }
            }
        )*
    };
}

impl_integer_state!(u8, u16, u32);
impl_float_state!(f32, f64);

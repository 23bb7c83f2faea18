/// Samples accumulated since the last reset, saturating at a ceiling.
///
/// The counter is the only blend-weight signal the kernel receives; the
/// renderer advances it once per presented frame and zeroes it whenever the
/// accumulation texture is cleared or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounter {
    value: u32,
    cap: u32,
}

impl FrameCounter {
    pub fn new(cap: u32) -> Self {
        Self { value: 0, cap }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn is_saturated(&self) -> bool {
        self.value >= self.cap
    }

    /// Advances by one unless already at the cap. Returns the new value and
    /// whether this call was the one that reached the cap.
    pub fn advance(&mut self) -> (u32, bool) {
        if self.value < self.cap {
            self.value += 1;
            (self.value, self.value == self.cap)
        } else {
            (self.value, false)
        }
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

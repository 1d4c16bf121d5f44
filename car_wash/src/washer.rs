/// The single washing bay
///
/// Busy while `wash_time_left > 0`. A wash lasts `seconds_for_wash` ticks
/// counted from the tick it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Washer {
    seconds_for_wash: usize,
    wash_time_left: usize,
}

impl Washer {
    pub fn new(seconds_for_wash: usize) -> Washer {
        debug_assert!(seconds_for_wash > 0, "a wash must take at least one tick");
        Washer {
            seconds_for_wash,
            wash_time_left: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.wash_time_left > 0
    }

    /// Panics if a car is already being washed
    pub fn start_washing(&mut self) {
        assert!(
            !self.is_busy(),
            "start_washing called with {} ticks of the previous wash left",
            self.wash_time_left
        );
        self.wash_time_left = self.seconds_for_wash;
    }

    /// One tick passes
    pub fn tick(&mut self) {
        self.wash_time_left = self.wash_time_left.saturating_sub(1);
    }

    pub fn wash_time_left(&self) -> usize {
        self.wash_time_left
    }
}

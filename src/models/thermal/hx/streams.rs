/// One value per stream of a two-stream heat exchanger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamPair<T> {
    pub cold: T,
    pub hot: T,
}

impl<T> StreamPair<T> {
    #[must_use]
    pub fn new(cold: T, hot: T) -> Self {
        Self { cold, hot }
    }

    /// Applies `f` to both streams.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> StreamPair<U> {
        StreamPair {
            cold: f(self.cold),
            hot: f(self.hot),
        }
    }
}

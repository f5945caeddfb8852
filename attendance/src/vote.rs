//! Strict majority voting.

/// Running count of positive and negative votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub positive: usize,
    pub negative: usize,
}

impl Tally {
    pub fn of(votes: &[bool]) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            tally.record(*vote);
        }
        tally
    }

    pub fn record(&mut self, vote: bool) {
        if vote {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative
    }

    /// Positive only on strictly more positive votes. An empty or tied
    /// tally is negative.
    pub fn majority(&self) -> bool {
        self.positive > self.negative
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub fn majority(votes: &[bool]) -> bool {
    Tally::of(votes).majority()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_against_one_is_positive() {
        assert!(majority(&[true, true, false]));
    }

    #[test]
    fn tie_is_negative() {
        assert!(!majority(&[true, false]));
        assert!(!majority(&[]));
    }

    #[test]
    fn two_against_three_is_negative() {
        let tally = Tally::of(&[true, true, false, false, false]);
        assert_eq!(tally, Tally { positive: 2, negative: 3 });
        assert!(!tally.majority());
        assert_eq!(tally.total(), 5);
    }
}

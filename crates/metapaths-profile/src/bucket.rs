//! Intermediate-size buckets.
//!
//! Every (e1, e2) product is classified by nonzero count on a fixed
//! ladder. Buckets stratify both the population survey and the benchmark
//! sampling, so the ladder must stay identical across all consumers.

/// Size class of an intermediate product, by nonzero count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeBucket {
    Tiny,
    Small,
    Medium,
    Large,
    XLarge,
    XXLarge,
    Huge,
}

impl SizeBucket {
    /// Ladder order, smallest first.
    pub const ALL: [SizeBucket; 7] = [
        SizeBucket::Tiny,
        SizeBucket::Small,
        SizeBucket::Medium,
        SizeBucket::Large,
        SizeBucket::XLarge,
        SizeBucket::XXLarge,
        SizeBucket::Huge,
    ];

    pub fn classify(nnz: u64) -> Self {
        if nnz < 1_000 {
            SizeBucket::Tiny
        } else if nnz < 10_000 {
            SizeBucket::Small
        } else if nnz < 100_000 {
            SizeBucket::Medium
        } else if nnz < 1_000_000 {
            SizeBucket::Large
        } else if nnz < 10_000_000 {
            SizeBucket::XLarge
        } else if nnz < 100_000_000 {
            SizeBucket::XXLarge
        } else {
            SizeBucket::Huge
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SizeBucket::Tiny => "tiny",
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
            SizeBucket::XLarge => "xlarge",
            SizeBucket::XXLarge => "xxlarge",
            SizeBucket::Huge => "huge",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Array index for per-bucket accumulators.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Guaranteed sample count per bucket where population allows. Small
    /// buckets get more samples because their per-chain noise dominates.
    pub fn default_min_samples(self) -> usize {
        match self {
            SizeBucket::Tiny => 400,
            SizeBucket::Small => 200,
            SizeBucket::Medium => 150,
            SizeBucket::Large => 100,
            SizeBucket::XLarge => 75,
            SizeBucket::XXLarge => 50,
            SizeBucket::Huge => 25,
        }
    }
}

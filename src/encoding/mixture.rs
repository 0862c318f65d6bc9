//! Hard shape selection for mixture strokes.

/// Interpretation a mixture stroke resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixtureChoice {
    /// Weight lane 0.
    Ellipsoid,
    /// Weight lane 1.
    Box,
    /// Weight lane 2.
    Line,
}

impl MixtureChoice {
    /// Lane index of the choice inside the one-hot vector.
    #[must_use]
    pub fn lane(self) -> usize {
        match self {
            Self::Ellipsoid => 0,
            Self::Box => 1,
            Self::Line => 2,
        }
    }

    /// The one-hot weight vector for this choice.
    #[must_use]
    pub fn one_hot(self) -> [f32; 3] {
        let mut weights = [0.0; 3];
        weights[self.lane()] = 1.0;
        weights
    }
}

/// Radii `(start, end)` of a unit line tapered by `dr`: the line case of a
/// mixture stroke and the scaled `line_a` family.
#[must_use]
pub fn line_radii(dr: f32) -> (f32, f32) {
    ((1.0 - dr).max(0.0), (1.0 + dr).max(0.0))
}

/// Softmax-normalize three logits.
///
/// The maximum is subtracted before exponentiation so large logits do not
/// overflow.
#[must_use]
pub fn softmax(logits: [f32; 3]) -> [f32; 3] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = logits.map(|l| (l - max).exp());
    let sum: f32 = exp.iter().sum();
    exp.map(|e| e / sum)
}

/// Pick the dominant interpretation. Ties go to the first-listed lane.
///
/// Softmax is monotonic, so the arg-max of the normalized weights is the
/// arg-max of the logits. It is taken on the logits directly: rounding in
/// `exp` can merge two distinct logits into equal weights.
#[must_use]
pub fn select(logits: [f32; 3]) -> MixtureChoice {
    let best = (1..3).fold(0, |best, lane| if logits[lane] > logits[best] { lane } else { best });
    match best {
        0 => MixtureChoice::Ellipsoid,
        1 => MixtureChoice::Box,
        _ => MixtureChoice::Line,
    }
}

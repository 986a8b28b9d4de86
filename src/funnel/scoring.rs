/// Score difference below which the diagnosis falls back to [`Category::Both`].
pub const DEAD_ZONE: f64 = 1.5;

/// Diagnosis bucket. Doubles as the scoring target of an answer option and as
/// the key of the diagnosis copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Knee,
    Shin,
    Both,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Knee, Category::Shin, Category::Both];

    /// Body part named in the sales pitch ("protocolo específico para ...").
    pub fn promo_target(self) -> &'static str {
        match self {
            Category::Knee => "o joelho",
            Category::Shin => "a canela",
            Category::Both => "suas pernas",
        }
    }
}

/// Running per-bucket score of one quiz attempt.
///
/// Every answer adds exactly one point in total, so `knee + shin` always equals
/// the number of answers applied so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreState {
    pub knee: f64,
    pub shin: f64,
}

impl ScoreState {
    /// Credits one answer. `Both` splits the point evenly between the buckets.
    pub fn credit(self, points_to: Category) -> Self {
        match points_to {
            Category::Knee => Self {
                knee: self.knee + 1.0,
                ..self
            },
            Category::Shin => Self {
                shin: self.shin + 1.0,
                ..self
            },
            Category::Both => Self {
                knee: self.knee + 0.5,
                shin: self.shin + 0.5,
            },
        }
    }

    pub fn total(&self) -> f64 {
        self.knee + self.shin
    }

    pub fn difference(&self) -> f64 {
        (self.knee - self.shin).abs()
    }

    /// Collapses the two scores into a diagnosis.
    ///
    /// A difference under [`DEAD_ZONE`] is treated as ambiguous and yields
    /// `Both`. Above it the strictly larger bucket wins.
    pub fn resolve(&self) -> Category {
        if self.difference() >= DEAD_ZONE {
            if self.knee > self.shin {
                Category::Knee
            } else {
                Category::Shin
            }
        } else {
            Category::Both
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Facial expression categories reported by the emotion model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Contempt,
}

impl Emotion {
    pub const ALL: &[Emotion] = &[
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
        Emotion::Contempt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Contempt => "contempt",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-emotion confidence in percent. Scores sum to 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionScores(BTreeMap<Emotion, f64>);

impl EmotionScores {
    /// Softmaxes raw model outputs into percentages.
    ///
    /// `labels[i]` names `logits[i]`; the two must have equal length.
    pub fn from_logits(labels: &[Emotion], logits: &[f32]) -> Result<Self, String> {
        if labels.len() != logits.len() {
            return Err(format!(
                "emotion model returned {} scores for {} labels",
                logits.len(),
                labels.len()
            ));
        }
        if logits.is_empty() {
            return Err("emotion model returned no scores".to_string());
        }

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
        let sum: f64 = exps.iter().sum();

        let mut scores = BTreeMap::new();
        for (&label, e) in labels.iter().zip(exps) {
            *scores.entry(label).or_insert(0.0) += e / sum * 100.0;
        }
        Ok(Self(scores))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.0.iter().map(|(&e, &s)| (e, s))
    }

    /// The highest-scoring emotion; ties go to the one listed first in [`Emotion::ALL`].
    pub fn dominant(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, f64)> = None;
        for (emotion, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((emotion, score)),
            }
        }
        best.map(|(emotion, _)| emotion)
    }
}

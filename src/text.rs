//! Legend and comment text transitions.
//!
//! Text changes play as a small four-state machine: `EaseIn`/`EaseOut` move
//! the text vertically while fading, `FadeIn`/`FadeOut` only fade. The two
//! out-states chain into their in-state, which is what produces the
//! "replace text" effect when a step overrides the legend. An animation is
//! expanded into an ordered list of [`TextPhase`] keyframes; hosts replay the
//! phases sequentially, so a phase never starts before the previous one
//! completed.

use serde::Serialize;

use crate::geometry::BLOCK_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnimation {
    EaseIn,
    EaseOut,
    FadeIn,
    FadeOut,
}

/// One keyframe of a text transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPhase {
    /// Instantaneous vertical jump applied before the transition starts.
    pub jump_to_y: Option<f64>,
    /// Whether the pending text content is applied at the start of this phase.
    pub sets_text: bool,
    /// Animated vertical target, if the phase moves the text.
    pub target_y: Option<f64>,
    pub target_opacity: f64,
    pub duration_ms: u32,
}

impl TextAnimation {
    /// Expand this animation into its ordered phase list.
    ///
    /// `y_start` is the resting baseline of the text row; eased text exits
    /// two block-heights above it and re-enters from two block-heights below,
    /// landing half a block-height under the baseline.
    pub fn sequence(self, y_start: f64, duration_ms: u32) -> Vec<TextPhase> {
        match self {
            TextAnimation::EaseOut => {
                let mut phases = vec![TextPhase {
                    jump_to_y: None,
                    sets_text: false,
                    target_y: Some(y_start - 2.0 * BLOCK_HEIGHT),
                    target_opacity: 0.0,
                    duration_ms,
                }];
                phases.extend(TextAnimation::EaseIn.sequence(y_start, duration_ms));
                phases
            }
            TextAnimation::EaseIn => vec![TextPhase {
                jump_to_y: Some(y_start + 2.0 * BLOCK_HEIGHT),
                sets_text: true,
                target_y: Some(y_start + BLOCK_HEIGHT / 2.0),
                target_opacity: 1.0,
                duration_ms,
            }],
            TextAnimation::FadeOut => {
                let mut phases = vec![TextPhase {
                    jump_to_y: None,
                    sets_text: false,
                    target_y: None,
                    target_opacity: 0.0,
                    duration_ms,
                }];
                phases.extend(TextAnimation::FadeIn.sequence(y_start, duration_ms));
                phases
            }
            TextAnimation::FadeIn => vec![TextPhase {
                jump_to_y: None,
                sets_text: true,
                target_y: None,
                target_opacity: 1.0,
                duration_ms,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_out_chains_into_ease_in() {
        let phases = TextAnimation::EaseOut.sequence(0.0, 500);
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].target_y, Some(-2.0 * BLOCK_HEIGHT));
        assert_eq!(phases[0].target_opacity, 0.0);
        assert!(!phases[0].sets_text);
        assert_eq!(phases[1].jump_to_y, Some(2.0 * BLOCK_HEIGHT));
        assert_eq!(phases[1].target_y, Some(BLOCK_HEIGHT / 2.0));
        assert_eq!(phases[1].target_opacity, 1.0);
        assert!(phases[1].sets_text);
    }

    #[test]
    fn fade_out_chains_without_vertical_motion() {
        let phases = TextAnimation::FadeOut.sequence(30.0, 500);
        assert_eq!(phases.len(), 2);
        assert!(phases
            .iter()
            .all(|p| p.target_y.is_none() && p.jump_to_y.is_none()));
        assert_eq!(phases[1].target_opacity, 1.0);
    }

    #[test]
    fn initial_draw_plays_only_the_in_phase() {
        let phases = TextAnimation::EaseIn.sequence(30.0, 500);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].target_y, Some(30.0 + BLOCK_HEIGHT / 2.0));
    }
}

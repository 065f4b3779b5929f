//! Enable rules tying an enabled flag to form and pager state.

use crate::model::{EnableBehaviorType, EnableBehaviors};
use crate::state::PagerState;

/// Evaluates declared enable behaviors against the latest form and pager state.
#[derive(Debug, Clone, Copy)]
pub struct EnableRules<'a> {
    behaviors: &'a [EnableBehaviorType],
}

impl<'a> EnableRules<'a> {
    pub fn new(behaviors: &'a [EnableBehaviorType]) -> Self {
        Self { behaviors }
    }

    fn has(&self, behavior: EnableBehaviorType) -> bool {
        self.behaviors.contains(&behavior)
    }

    /// Validation and submission rule, `None` without form behaviors.
    pub fn form_rule(&self, is_valid: bool, is_submitted: bool) -> Option<bool> {
        if !self.behaviors.has_form_behaviors() {
            return None;
        }
        let submission = !self.has(EnableBehaviorType::FormSubmission) || !is_submitted;
        let validation = !self.has(EnableBehaviorType::FormValidation) || is_valid;
        Some(submission && validation)
    }

    /// Pager position rule, `None` without pager behaviors.
    pub fn pager_rule(&self, has_next: bool, has_previous: bool) -> Option<bool> {
        if !self.behaviors.has_pager_behaviors() {
            return None;
        }
        let next = self.has(EnableBehaviorType::PagerNext);
        let previous = self.has(EnableBehaviorType::PagerPrevious);
        Some(
            (next && previous && (has_next || has_previous))
                || (next && has_next)
                || (previous && has_previous),
        )
    }

    /// Resulting enabled flag.
    ///
    /// `form` is `(is_valid, is_submitted)` of the governing form. Every rule
    /// that applies must hold, and the parent must be enabled. With no
    /// applicable rule `current` is kept, still gated by the parent.
    pub fn evaluate(
        &self,
        parent_enabled: bool,
        form: Option<(bool, bool)>,
        pager: Option<&PagerState>,
        current: bool,
    ) -> bool {
        let form = form.and_then(|(is_valid, is_submitted)| self.form_rule(is_valid, is_submitted));
        let pager = pager.and_then(|p| self.pager_rule(p.has_next, p.has_previous));
        let rules: Vec<bool> = form.into_iter().chain(pager).collect();
        if rules.is_empty() {
            parent_enabled && current
        } else {
            parent_enabled && rules.into_iter().all(|holds| holds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvi::Reducer;
    use crate::state::{PagerIntent, PagerReducer};
    use EnableBehaviorType::*;

    fn pager_at(position: usize) -> PagerState {
        PagerReducer::reduce(PagerState::new("pager", 3), PagerIntent::Scroll(position))
    }

    #[test]
    fn pager_rule_over_three_pages() {
        // (behaviors, enabled at positions 0, 1, 2)
        let cases: [(&[EnableBehaviorType], [bool; 3]); 4] = [
            (&[PagerNext, PagerPrevious], [true, true, true]),
            (&[PagerNext], [true, true, false]),
            (&[PagerPrevious], [false, true, true]),
            (&[], [true, true, true]),
        ];
        for (behaviors, expected) in cases {
            let rules = EnableRules::new(behaviors);
            for (position, enabled) in expected.into_iter().enumerate() {
                let pager = pager_at(position);
                assert_eq!(
                    rules.evaluate(true, None, Some(&pager), true),
                    enabled,
                    "{behaviors:?} at {position}"
                );
            }
        }
    }

    #[test]
    fn parent_disablement_gates_whole_pager_rule() {
        let rules = EnableRules::new(&[PagerPrevious]);
        assert!(!rules.evaluate(false, None, Some(&pager_at(2)), true));
    }

    #[test]
    fn form_rule_table() {
        let both = [FormValidation, FormSubmission];
        let rules = EnableRules::new(&both);
        assert_eq!(rules.form_rule(true, false), Some(true));
        assert_eq!(rules.form_rule(false, false), Some(false));
        assert_eq!(rules.form_rule(true, true), Some(false));

        let submission = [FormSubmission];
        let rules = EnableRules::new(&submission);
        assert_eq!(rules.form_rule(false, false), Some(true));
        assert_eq!(rules.form_rule(false, true), Some(false));

        let validation = [FormValidation];
        let rules = EnableRules::new(&validation);
        assert_eq!(rules.form_rule(true, true), Some(true));
        assert_eq!(rules.form_rule(false, false), Some(false));

        assert_eq!(EnableRules::new(&[PagerNext]).form_rule(true, false), None);
    }

    #[test]
    fn no_applicable_rule_keeps_current_value() {
        let rules = EnableRules::new(&[]);
        assert!(!rules.evaluate(true, Some((true, false)), None, false));
        assert!(rules.evaluate(true, Some((false, true)), None, true));
        assert!(!rules.evaluate(false, None, None, true));
    }

    #[test]
    fn form_and_pager_rules_combine() {
        let behaviors = [FormValidation, PagerNext];
        let rules = EnableRules::new(&behaviors);
        assert!(rules.evaluate(true, Some((true, false)), Some(&pager_at(0)), true));
        assert!(!rules.evaluate(true, Some((false, false)), Some(&pager_at(0)), true));
        assert!(!rules.evaluate(true, Some((true, false)), Some(&pager_at(2)), true));
    }
}

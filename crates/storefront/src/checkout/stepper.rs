//! Four-step checkout state machine.
//!
//! ```text
//! Contact -> Shipping -> Payment -> Review
//! ```
//!
//! Moving forward requires the current step's fields to validate. Moving
//! back is always allowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fields::{
    CheckoutForm, FieldErrors, validate_contact, validate_payment, validate_shipping,
};

/// A checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Contact,
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 4] = [Self::Contact, Self::Shipping, Self::Payment, Self::Review];

    /// 1-based position.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
            Self::Review => 4,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Contact => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Contact => None,
            Self::Shipping => Some(Self::Contact),
            Self::Payment => Some(Self::Shipping),
            Self::Review => Some(Self::Payment),
        }
    }

    /// Parse a path segment (`contact`, `2`, ...).
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.trim().to_ascii_lowercase().as_str() {
            "contact" | "1" => Some(Self::Contact),
            "shipping" | "2" => Some(Self::Shipping),
            "payment" | "3" => Some(Self::Payment),
            "review" | "4" => Some(Self::Review),
            _ => None,
        }
    }

    /// Field errors for this step.
    #[must_use]
    pub fn validate(self, form: &CheckoutForm) -> FieldErrors {
        match self {
            Self::Contact => validate_contact(form),
            Self::Shipping => validate_shipping(form),
            Self::Payment => validate_payment(form),
            Self::Review => FieldErrors::default(),
        }
    }
}

/// Progress indicator state for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

/// One entry of the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub step: CheckoutStep,
    pub number: u8,
    pub status: StepStatus,
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepChange {
    pub step: CheckoutStep,
    pub progress: Vec<StepProgress>,
    /// The page should scroll back to the top.
    pub reset_scroll: bool,
}

/// Why a transition was refused. The current step is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepRejected {
    /// Some fields of the step failed validation.
    #[error("Please fix the highlighted fields: {errors}")]
    InvalidFields {
        step: CheckoutStep,
        errors: FieldErrors,
    },

    /// Review is the last step; the order is placed by submitting.
    #[error("Already at the final step")]
    AtFinalStep,

    /// Only completed steps can be jumped to.
    #[error("Cannot skip ahead to step {to:?}")]
    ForwardJump {
        from: CheckoutStep,
        to: CheckoutStep,
    },
}

/// The checkout step machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutStepper {
    current: CheckoutStep,
}

impl CheckoutStepper {
    /// Start at `Contact`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume at a stored step.
    #[must_use]
    pub const fn at(step: CheckoutStep) -> Self {
        Self { current: step }
    }

    #[must_use]
    pub const fn current(&self) -> CheckoutStep {
        self.current
    }

    /// Validate the current step and move forward.
    ///
    /// # Errors
    ///
    /// Returns [`StepRejected::InvalidFields`] if any field fails, or
    /// [`StepRejected::AtFinalStep`] from `Review`.
    pub fn advance(&mut self, form: &CheckoutForm) -> Result<StepChange, StepRejected> {
        let next = self.current.next().ok_or(StepRejected::AtFinalStep)?;
        self.current
            .validate(form)
            .into_result()
            .map_err(|errors| StepRejected::InvalidFields {
                step: self.current,
                errors,
            })?;

        self.current = next;
        Ok(self.change())
    }

    /// Move back one step. No-op at `Contact`.
    pub fn retreat(&mut self) -> StepChange {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.change()
    }

    /// Jump back to a completed step (or stay on the current one).
    ///
    /// # Errors
    ///
    /// Returns [`StepRejected::ForwardJump`] for a step not yet reached.
    pub fn go_to(&mut self, step: CheckoutStep) -> Result<StepChange, StepRejected> {
        if step > self.current {
            return Err(StepRejected::ForwardJump {
                from: self.current,
                to: step,
            });
        }
        self.current = step;
        Ok(self.change())
    }

    /// Progress indicator for every step.
    #[must_use]
    pub fn progress(&self) -> Vec<StepProgress> {
        CheckoutStep::ALL
            .into_iter()
            .map(|step| StepProgress {
                step,
                number: step.number(),
                status: match step.cmp(&self.current) {
                    std::cmp::Ordering::Less => StepStatus::Completed,
                    std::cmp::Ordering::Equal => StepStatus::Current,
                    std::cmp::Ordering::Greater => StepStatus::Pending,
                },
            })
            .collect()
    }

    fn change(&self) -> StepChange {
        StepChange {
            step: self.current,
            progress: self.progress(),
            reset_scroll: true,
        }
    }
}

/// Validate every step before submission.
///
/// # Errors
///
/// Returns [`StepRejected::InvalidFields`] naming the first failing step and
/// carrying the messages of all steps.
pub fn validate_all(form: &CheckoutForm) -> Result<(), StepRejected> {
    let mut first_failing = None;
    let mut errors = FieldErrors::default();

    for step in CheckoutStep::ALL {
        let step_errors = step.validate(form);
        if !step_errors.is_empty() && first_failing.is_none() {
            first_failing = Some(step);
        }
        errors.extend(step_errors);
    }

    match first_failing {
        None => Ok(()),
        Some(step) => Err(StepRejected::InvalidFields { step, errors }),
    }
}

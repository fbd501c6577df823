use serde::Serialize;

use super::blueprint::OnboardingBlueprint;
use super::domain::{FieldMap, Record, SectionInput, SectionKey};
use super::schema::{FieldDescriptor, ValidationError};

/// Read-only view of the active step, used by presentation layers to render it.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub index: usize,
    pub position: usize,
    pub total_steps: usize,
    pub key: &'static str,
    pub title: &'static str,
    pub section: Option<SectionKey>,
    pub fields: Vec<FieldDescriptor>,
    pub values: FieldMap,
    pub can_retreat: bool,
    pub is_terminal: bool,
    pub progress_percent: u8,
}

/// Navigation state of a single onboarding session.
///
/// Only the transition methods mutate it. A rejected advance leaves it untouched, so
/// retrying is always safe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WizardState {
    current_step_index: usize,
    record: Record,
    started: bool,
}

impl WizardState {
    /// Un-started state with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self, blueprint: &OnboardingBlueprint) -> bool {
        self.started && self.current_step_index == blueprint.terminal_index()
    }

    /// Leave the introductory view and enter the first step.
    pub fn start(&mut self) -> &Self {
        if !self.started {
            self.started = true;
            self.current_step_index = 0;
        }
        self
    }

    /// Validate `input` for the active step, merge it and move forward one step.
    ///
    /// `step_index` must name the active step. At the terminal step this is a no-op.
    pub fn advance(
        &mut self,
        blueprint: &OnboardingBlueprint,
        step_index: usize,
        input: &SectionInput,
    ) -> Result<&Self, ValidationError> {
        if !self.started {
            return Err(ValidationError::single(
                "step",
                "Registration has not been started",
            ));
        }
        if step_index != self.current_step_index {
            return Err(ValidationError::single(
                "step",
                format!(
                    "Step {step_index} is not the active step (currently on step {})",
                    self.current_step_index
                ),
            ));
        }
        if self.current_step_index >= blueprint.terminal_index() {
            return Ok(&*self);
        }

        let data = blueprint.validate(step_index, input).into_result()?;
        self.record.replace(data);
        self.current_step_index += 1;
        Ok(&*self)
    }

    /// Step back one position without validating or discarding anything.
    pub fn retreat(&mut self, blueprint: &OnboardingBlueprint) -> &Self {
        let navigable = blueprint
            .step(self.current_step_index)
            .map(|template| template.navigable_back)
            .unwrap_or(false);
        if self.started && navigable {
            self.current_step_index = self.current_step_index.saturating_sub(1);
        }
        self
    }

    /// Drop all entered data and return to the introductory view.
    pub fn reset(&mut self) -> &Self {
        *self = Self::default();
        self
    }

    pub fn current_step(&self, blueprint: &OnboardingBlueprint) -> Option<StepView> {
        if !self.started {
            return None;
        }

        let template = blueprint.step(self.current_step_index)?;
        let total_steps = blueprint.len();
        let section = template.section();
        let (fields, values) = match &template.schema {
            Some(schema) => (
                schema.descriptors(),
                self.record.section_values(schema.section()),
            ),
            None => (Vec::new(), FieldMap::new()),
        };
        let progress = (self.current_step_index + 1) * 100 / total_steps.max(1);

        Some(StepView {
            index: self.current_step_index,
            position: self.current_step_index + 1,
            total_steps,
            key: template.step.key(),
            title: template.step.label(),
            section,
            fields,
            values,
            can_retreat: template.navigable_back && self.current_step_index > 0,
            is_terminal: self.current_step_index == blueprint.terminal_index(),
            progress_percent: progress.min(100) as u8,
        })
    }

    /// The assembled record, available once the terminal step has been reached.
    pub fn assembled_record(&self, blueprint: &OnboardingBlueprint) -> Option<&Record> {
        self.is_complete(blueprint).then_some(&self.record)
    }
}

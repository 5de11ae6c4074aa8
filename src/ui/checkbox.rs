use iced::{
    widget::{button, column, row, text},
    Color, Element, Length,
};

pub(crate) const ERROR_COLOR: Color = Color {
    r: 0.86,
    g: 0.15,
    b: 0.15,
    a: 1.0,
};
pub(crate) const MUTED_COLOR: Color = Color {
    r: 0.45,
    g: 0.45,
    b: 0.45,
    a: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

impl CheckState {
    /// Indeterminate boxes become checked when clicked.
    pub fn toggled(self) -> Self {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            CheckState::Unchecked | CheckState::Indeterminate => CheckState::Checked,
        }
    }

    pub fn is_checked(self) -> bool {
        self == CheckState::Checked
    }

    fn indicator(self) -> &'static str {
        match self {
            CheckState::Unchecked => "",
            CheckState::Checked => "✓",
            CheckState::Indeterminate => "–",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckboxSize {
    Sm,
    #[default]
    Md,
    Lg,
}

impl CheckboxSize {
    /// Edge length of the box in logical pixels.
    pub fn box_size(self) -> f32 {
        match self {
            CheckboxSize::Sm => 12.0,
            CheckboxSize::Md => 16.0,
            CheckboxSize::Lg => 20.0,
        }
    }
}

/// Which text describes the control to assistive technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribedBy {
    Error,
    Description,
}

/// Labelled checkbox with optional description and error line.
#[derive(Debug, Clone, Default)]
pub struct Checkbox<'a> {
    state: CheckState,
    label: Option<&'a str>,
    description: Option<&'a str>,
    error: Option<&'a str>,
    disabled: bool,
    size: CheckboxSize,
}

impl<'a> Checkbox<'a> {
    pub fn new(state: CheckState) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error.filter(|e| !e.is_empty());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn size(mut self, size: CheckboxSize) -> Self {
        self.size = size;
        self
    }

    pub fn is_invalid(&self) -> bool {
        self.error.is_some()
    }

    /// The error wins over the description.
    pub fn described_by(&self) -> Option<DescribedBy> {
        if self.error.is_some() {
            Some(DescribedBy::Error)
        } else if self.description.is_some() {
            Some(DescribedBy::Description)
        } else {
            None
        }
    }

    pub fn view<Message: Clone + 'a>(
        self,
        on_toggle: impl Fn(CheckState) -> Message,
    ) -> Element<'a, Message> {
        let edge = self.size.box_size();
        let on_press = (!self.disabled).then(|| on_toggle(self.state.toggled()));

        let indicator = button(text(self.state.indicator()).size(edge * 0.75))
            .width(Length::Fixed(edge + 4.0))
            .height(Length::Fixed(edge + 4.0))
            .padding(0)
            .on_press_maybe(on_press);

        let mut labels = column![].spacing(4);
        if let Some(label) = self.label {
            labels = labels.push(text(label).size(14));
        }
        // One helper line under the label; an error replaces the description.
        match (self.described_by(), self.error, self.description) {
            (Some(DescribedBy::Error), Some(error), _) => {
                labels = labels.push(text(error).size(12).color(ERROR_COLOR));
            }
            (Some(DescribedBy::Description), _, Some(description)) => {
                labels = labels.push(text(description).size(12).color(MUTED_COLOR));
            }
            _ => {}
        }

        row![indicator, labels].spacing(8).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_cycles_to_checked_and_back() {
        assert_eq!(CheckState::Unchecked.toggled(), CheckState::Checked);
        assert_eq!(CheckState::Indeterminate.toggled(), CheckState::Checked);
        assert_eq!(CheckState::Checked.toggled(), CheckState::Unchecked);
    }

    #[test]
    fn error_takes_precedence_for_description() {
        let plain = Checkbox::new(CheckState::Checked).label("Keep name");
        assert_eq!(plain.described_by(), None);
        assert!(!plain.is_invalid());

        let described = plain.clone().description("Uses the catalogue name");
        assert_eq!(described.described_by(), Some(DescribedBy::Description));

        let failing = described.error(Some("Required"));
        assert_eq!(failing.described_by(), Some(DescribedBy::Error));
        assert!(failing.is_invalid());
    }

    #[test]
    fn empty_error_is_not_an_error() {
        let checkbox = Checkbox::new(CheckState::Unchecked).error(Some(""));
        assert!(!checkbox.is_invalid());
    }

    #[test]
    fn sizes() {
        assert_eq!(CheckboxSize::default(), CheckboxSize::Md);
        assert_eq!(CheckboxSize::Sm.box_size(), 12.0);
        assert_eq!(CheckboxSize::Lg.box_size(), 20.0);
    }
}

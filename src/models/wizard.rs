use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectCourt,
    SelectTime,
    EnterDetails,
    ChoosePayment,
    Confirmed,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::SelectCourt => "select_court",
            WizardStep::SelectTime => "select_time",
            WizardStep::EnterDetails => "enter_details",
            WizardStep::ChoosePayment => "choose_payment",
            WizardStep::Confirmed => "confirmed",
        }
    }
}

use crate::input::InputState;
use hooked_ravelry::{CompletionSender, FlowId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnboardingScreen {
    Welcome,
    LinkAccount,
    Exchanging,
}

pub struct OnboardingState {
    pub current_screen: OnboardingScreen,
    pub auth_url: Option<String>,
    pub redirect_input: InputState,
    pub error_message: Option<String>,
    flow: Option<FlowId>,
    completion: Option<CompletionSender>,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingState {
    pub fn new() -> Self {
        Self {
            current_screen: OnboardingScreen::Welcome,
            auth_url: None,
            redirect_input: InputState::new(),
            error_message: None,
            flow: None,
            completion: None,
        }
    }

    /// Shows the authorization URL and holds the sender the pasted redirect
    /// will be delivered through.
    pub fn begin_link(&mut self, auth_url: String, flow: FlowId, completion: CompletionSender) {
        self.current_screen = OnboardingScreen::LinkAccount;
        self.auth_url = Some(auth_url);
        self.flow = Some(flow);
        self.redirect_input.clear();
        self.completion = Some(completion);
    }

    /// Hands back the pending sender, at most once per link attempt.
    pub fn take_completion(&mut self) -> Option<CompletionSender> {
        self.completion.take()
    }

    /// The flow this screen is linking, if any.
    pub fn flow(&self) -> Option<FlowId> {
        self.flow
    }

    pub fn is_waiting_for_redirect(&self) -> bool {
        self.completion.is_some()
    }

    pub fn reset(&mut self) {
        self.current_screen = OnboardingScreen::Welcome;
        self.auth_url = None;
        self.redirect_input.clear();
        self.flow = None;
        self.completion = None;
    }
}

use hooked_ravelry::{AuthError, AuthStatus, FlowId, Session};

pub enum AppAsyncEvent {
    AuthorizationFinished {
        flow: FlowId,
        result: Result<Session, AuthError>,
    },
    SessionChanged(AuthStatus),
}

use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Users;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Login, Register, Reset, List }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Login => "login",
        Phase::Register => "register",
        Phase::Reset => "reset",
        Phase::List => "list",
    }}
    fn span(&self) -> Span { match self {
        Phase::Login => info_span!("login"),
        Phase::Register => info_span!("register"),
        Phase::Reset => info_span!("reset"),
        Phase::List => info_span!("list"),
    }}
}

impl OpMarker for Users {
    const NAME: &'static str = "users";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("users") }
}

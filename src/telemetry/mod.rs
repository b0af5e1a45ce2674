pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one typed context per operation
pub fn agg() -> LogCtx<ops::agg::Agg> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn users() -> LogCtx<ops::users::Users> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn feeds() -> LogCtx<ops::feeds::Feeds> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn follows() -> LogCtx<ops::follows::Follows> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn browse() -> LogCtx<ops::browse::Browse> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }

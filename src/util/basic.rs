// Plain string errors, for layers that only ever report to the user.
pub type SError = String;

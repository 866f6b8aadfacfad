// Image generation: the model-or-placeholder facade and its HTTP handlers.
// External model calls go through model_client only.

pub mod facade;
pub mod handlers;

/// Simple pendulum integration, lifecycle phases and parameter validation.
pub mod pendulum;

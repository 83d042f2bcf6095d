//! defer-adapters: piezas concretas sobre el core neutral.
//!
//! - `tasks`: una librería de tasks y subworkflows de ejemplo, declarados
//!   con las macros del core; la usan los tests de integración de ambos
//!   crates.
//! - `renderer`: un renderer estructurado neutral (`OutlineRenderer`) que
//!   ejercita el render boundary sin fijar ningún formato de workflow
//!   externo.

pub mod renderer;
pub mod tasks;

pub use renderer::OutlineRenderer;

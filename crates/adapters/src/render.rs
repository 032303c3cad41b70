// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource unit expression rendering

use restraint_core::{template, ExecutionContext};

/// Renders a step's resource unit expression against its execution context.
///
/// Anything the renderer cannot resolve must be left in place; callers
/// reject units that still carry expression syntax.
pub trait ExpressionRenderer: Clone + Send + Sync + 'static {
    fn render(&self, expression: &str, ctx: &ExecutionContext) -> String;
}

/// Interpolates `{name}`, `<+name>` and `${ENV:-default}` from context variables
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionRenderer for TemplateRenderer {
    fn render(&self, expression: &str, ctx: &ExecutionContext) -> String {
        template::interpolate(expression, &ctx.variables)
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

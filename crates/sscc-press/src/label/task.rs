use super::{LabelComposer, LabeledImage};
use crate::{CanonicalCode, RenderError, SymbolRenderer};
use std::sync::Arc;

/// Everything a worker needs to turn a code into a labeled image.
///
/// Shared read-only by every worker in the pool.
pub struct RenderContext {
    renderer: Arc<dyn SymbolRenderer>,
    composer: LabelComposer,
}

impl RenderContext {
    pub fn new(renderer: Arc<dyn SymbolRenderer>, composer: LabelComposer) -> Self {
        Self { renderer, composer }
    }
}

/// Renders one canonical code: symbol first, then the label composed around
/// it.
#[derive(Clone, Debug)]
pub struct RenderTask {
    code: CanonicalCode,
}

impl RenderTask {
    pub const fn new(code: CanonicalCode) -> Self {
        Self { code }
    }

    pub const fn code(&self) -> &CanonicalCode {
        &self.code
    }

    /// # Errors
    ///
    /// Propagates any [`RenderError`] from the symbol renderer or the
    /// composer.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all, fields(row = self.code.index() + 1)))]
    pub fn run(&self, ctx: &RenderContext) -> Result<LabeledImage, RenderError> {
        let symbol = ctx.renderer.render(self.code.tagged())?;
        ctx.composer
            .compose(self.code.index(), &symbol, self.code.tagged())
    }
}

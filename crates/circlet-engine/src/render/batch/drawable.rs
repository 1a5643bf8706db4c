use crate::render::backend::GraphicsContext;

/// Something an external render loop can draw into a target.
///
/// The context is passed explicitly; implementations must be called from the
/// thread that owns it.
pub trait Drawable<C: GraphicsContext> {
    fn draw(&self, ctx: &C, target: &mut C::Target<'_>);
}

impl<C: GraphicsContext, D: Drawable<C> + ?Sized> Drawable<C> for &D {
    #[inline]
    fn draw(&self, ctx: &C, target: &mut C::Target<'_>) {
        (**self).draw(ctx, target);
    }
}

impl<C: GraphicsContext, D: Drawable<C> + ?Sized> Drawable<C> for Box<D> {
    #[inline]
    fn draw(&self, ctx: &C, target: &mut C::Target<'_>) {
        (**self).draw(ctx, target);
    }
}

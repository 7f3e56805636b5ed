//! Effect construction macros.

/// Wrap an async block returning `Option<Action>` in an [`Effect::Future`]
///
/// The block is `async move`, so clone what it needs out of the
/// environment first.
///
/// ```ignore
/// let odds = Arc::clone(&env.odds);
/// async_effect! {
///     match odds.events(&sport).await {
///         Ok(events) => Some(CatalogAction::EventsLoaded { request, events }),
///         Err(error) => Some(CatalogAction::LoadFailed { request, message: error.to_string() }),
///     }
/// }
/// ```
///
/// [`Effect::Future`]: crate::effect::Effect::Future
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[derive(Debug, PartialEq)]
    enum QuoteAction {
        Quoted { price: i32 },
    }

    #[test]
    fn async_effect_moves_captures() {
        let price = -110;
        let effect = async_effect! { Some(QuoteAction::Quoted { price }) };

        let Effect::Future(quote) = effect else {
            unreachable!("async_effect! builds a future");
        };
        assert_eq!(tokio_test::block_on(quote), Some(QuoteAction::Quoted { price: -110 }));
    }

    #[test]
    fn async_effect_may_produce_nothing() {
        let effect = async_effect! { None::<QuoteAction> };
        let Effect::Future(silent) = effect else {
            unreachable!("async_effect! builds a future");
        };
        assert_eq!(tokio_test::block_on(silent), None);
    }
}

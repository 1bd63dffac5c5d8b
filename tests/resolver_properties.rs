//! Property tests for the endpoint resolver

use liora::resolver::{
    CatalogKind, DEFAULT_ENDPOINT, OutputType, ResolutionRequest, normalize, resolve,
    resolve_endpoint,
};
use proptest::prelude::*;

fn output_type() -> impl Strategy<Value = OutputType> {
    prop_oneof![Just(OutputType::Image), Just(OutputType::Video)]
}

proptest! {
    #[test]
    fn resolution_is_deterministic(
        model in "[a-zA-Z0-9 _/.-]{0,40}",
        output in output_type(),
        has_image in any::<bool>(),
    ) {
        let first = resolve(&ResolutionRequest::new(&model, output).with_image_input(has_image));
        let second = resolve(&ResolutionRequest::new(&model, output).with_image_input(has_image));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn result_is_in_selected_catalog_or_default(
        model in "\\PC{0,30}",
        output in output_type(),
        has_image in any::<bool>(),
    ) {
        let resolution = resolve(&ResolutionRequest::new(&model, output).with_image_input(has_image));
        prop_assert_eq!(resolution.catalog, CatalogKind::select(output, has_image));
        if normalize(&model).is_empty() {
            prop_assert_eq!(resolution.endpoint, DEFAULT_ENDPOINT);
        } else {
            prop_assert!(resolution.catalog.entries().contains(&resolution.endpoint));
        }
    }

    #[test]
    fn separator_only_input_is_default(
        model in "[ _/.,!?-]{0,20}",
        output in output_type(),
        has_image in any::<bool>(),
    ) {
        prop_assert_eq!(resolve_endpoint(&model, output, has_image), DEFAULT_ENDPOINT);
    }

    #[test]
    fn catalog_entries_resolve_to_a_superset_of_themselves(
        index in 0usize..16,
        output in output_type(),
        has_image in any::<bool>(),
    ) {
        let catalog = CatalogKind::select(output, has_image);
        let entries = catalog.entries();
        let entry = entries[index % entries.len()];

        let resolved = resolve_endpoint(entry, output, has_image);
        let wanted = normalize(entry);
        let got = normalize(resolved);
        prop_assert!(wanted.is_subset_of(&got), "{} -> {}", entry, resolved);
    }

    #[test]
    fn casing_does_not_matter(
        model in "[a-z0-9 -]{1,30}",
        output in output_type(),
        has_image in any::<bool>(),
    ) {
        prop_assert_eq!(
            resolve_endpoint(&model.to_uppercase(), output, has_image),
            resolve_endpoint(&model, output, has_image)
        );
    }
}

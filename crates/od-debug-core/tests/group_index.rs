//! Tests for the Metric Group Index over realistic group collections.

use od_debug_core::{
    ElementPath, InpData, InpObservation, LocatorKind, Rating, UrlMetric, UrlMetricGroup,
    UrlMetricGroupCollection,
};

fn path(s: &str) -> ElementPath {
    s.parse().unwrap()
}

fn breakpoints() -> Vec<UrlMetricGroup> {
    vec![
        UrlMetricGroup::new(0, Some(480)),
        UrlMetricGroup::new(481, Some(600)),
        UrlMetricGroup::new(601, Some(782)),
        UrlMetricGroup::new(783, None),
    ]
}

#[test_log::test]
fn test_unpopulated_collection() {
    let collection = UrlMetricGroupCollection::new(breakpoints());
    assert!(!collection.is_any_group_populated());
    assert!(!collection.has_inp_data());
    assert!(
        collection
            .inp_observations(LocatorKind::InteractionTarget)
            .is_empty()
    );
}

#[test_log::test]
fn test_cta_observations_accumulate() {
    let mut groups = breakpoints();
    groups[3].push(
        UrlMetric::new(1280).with_inp_data(vec![InpData::new(120.0, Rating::Good, "#cta")]),
    );
    groups[3].push(
        UrlMetric::new(1440).with_inp_data(vec![InpData::new(340.0, Rating::Poor, "#cta")]),
    );
    let collection = UrlMetricGroupCollection::new(groups);

    assert!(collection.is_any_group_populated());
    let bucket = &collection.groups()[3];
    let observations = bucket.inp_observations(LocatorKind::InteractionTarget);
    assert_eq!(observations.len(), 1);
    assert_eq!(
        observations["#cta"],
        [
            InpObservation {
                value: 120.0,
                rating: Rating::Good
            },
            InpObservation {
                value: 340.0,
                rating: Rating::Poor
            },
        ]
    );
}

#[test_log::test]
fn test_lcp_path_per_bucket() {
    let mut groups = breakpoints();
    groups[0] = UrlMetricGroup::new(0, Some(480))
        .with_lcp_element(path("/HTML[1]/BODY[1]/MAIN[1]/IMG[1]"))
        .with_url_metric(UrlMetric::new(360).with_lcp_element(path("/HTML[1]/BODY[1]/MAIN[1]/IMG[1]")));
    let collection = UrlMetricGroupCollection::new(groups);

    let paths: Vec<Option<&str>> = collection
        .iter()
        .map(|group| group.lcp_path().map(ElementPath::as_str))
        .collect();
    assert_eq!(
        paths,
        vec![Some("/HTML[1]/BODY[1]/MAIN[1]/IMG[1]"), None, None, None]
    );
}

#[test_log::test]
fn test_element_path_locators_across_buckets() {
    let button = path("/HTML[1]/BODY[1]/BUTTON[1]");
    let mut groups = breakpoints();
    groups[1].push(UrlMetric::new(500).with_inp_data(vec![
        InpData::new(90.0, Rating::Good, "#buy").with_xpath(button.clone()),
        InpData::new(70.0, Rating::Good, "#detached"),
    ]));
    groups[2].push(UrlMetric::new(700).with_inp_data(vec![
        InpData::new(220.0, Rating::NeedsImprovement, "#buy").with_xpath(button.clone()),
    ]));
    let collection = UrlMetricGroupCollection::new(groups);

    let by_path = collection.inp_observations(LocatorKind::ElementPath);
    assert_eq!(by_path.len(), 1);
    let ratings: Vec<Rating> = by_path[button.as_str()]
        .iter()
        .map(|observation| observation.rating)
        .collect();
    assert_eq!(ratings, vec![Rating::Good, Rating::NeedsImprovement]);

    let by_target = collection.inp_observations(LocatorKind::InteractionTarget);
    assert_eq!(by_target["#buy"].len(), 2);
    assert_eq!(by_target["#detached"].len(), 1);
}

#[test_log::test]
fn test_bad_stored_path_only_loses_its_own_locator() {
    let json = r##"[
        {
            "minimumViewportWidth": 0,
            "maximumViewportWidth": null,
            "urlMetrics": [{
                "viewportWidth": 390,
                "inpData": [
                    { "value": 300, "rating": "poor", "interactionTarget": "#menu", "xpath": "HTML/BODY" },
                    { "value": 80, "rating": "good", "interactionTarget": "#cta", "xpath": "/HTML[1]/BODY[1]/BUTTON[1]" }
                ]
            }]
        }
    ]"##;
    let collection: UrlMetricGroupCollection = serde_json::from_str(json).unwrap();

    let by_target = collection.inp_observations(LocatorKind::InteractionTarget);
    assert_eq!(by_target.keys().collect::<Vec<_>>(), ["#menu", "#cta"]);

    let by_path = collection.inp_observations(LocatorKind::ElementPath);
    assert_eq!(by_path.len(), 1);
    assert_eq!(
        by_path["/HTML[1]/BODY[1]/BUTTON[1]"],
        [InpObservation {
            value: 80.0,
            rating: Rating::Good
        }]
    );
}

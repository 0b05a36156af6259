//! Country-based eligibility policy
//!
//! Pure, side-effect-free functions over a caller-supplied worldwide country
//! id. The worldwide marker is a sentinel country meaning "no geographic
//! restriction"; a program with an empty country set is implicitly
//! worldwide.

use uuid::Uuid;

/// Whether a user may participate in a program, based on countries alone.
///
/// Accessible when the user has no country on file (nothing to restrict
/// against), the program declares no countries (implicit worldwide), or the
/// program's set contains the worldwide marker or the user's country.
#[must_use]
pub fn program_accessible_to_user(
    worldwide_id: Uuid,
    user_country_id: Option<Uuid>,
    program_countries: Option<&[Uuid]>,
) -> bool {
    let Some(user_country) = user_country_id else {
        return true;
    };
    match program_countries {
        None => true,
        Some(countries) => {
            countries.is_empty()
                || countries.contains(&worldwide_id)
                || countries.contains(&user_country)
        }
    }
}

/// Whether a program qualifies as the system default: its country set must
/// represent "worldwide", either implicitly (empty/absent) or explicitly.
#[must_use]
pub fn default_program_is_worldwide(
    worldwide_id: Uuid,
    program_countries: Option<&[Uuid]>,
) -> bool {
    match program_countries {
        None => true,
        Some(countries) => countries.is_empty() || countries.contains(&worldwide_id),
    }
}

/// Resolves the effective country filter for a program search.
///
/// Requested countries are deduplicated first. An authenticated non-admin
/// with a known country always gets exactly `[user_country, worldwide]`
/// regardless of the request (a visibility ceiling). Otherwise, with no
/// explicit request, admins get `None` (unrestricted) and everyone else
/// defaults to `[worldwide]`; an explicit request is returned verbatim.
#[must_use]
pub fn resolve_available_countries(
    worldwide_id: Uuid,
    is_authenticated: bool,
    is_admin: bool,
    user_country_id: Option<Uuid>,
    requested: Option<Vec<Uuid>>,
) -> Option<Vec<Uuid>> {
    let requested = requested.map(dedupe).filter(|countries| !countries.is_empty());

    if is_authenticated && !is_admin {
        if let Some(user_country) = user_country_id {
            return Some(vec![user_country, worldwide_id]);
        }
    }

    match requested {
        Some(explicit) => Some(explicit),
        None if is_admin => None,
        None => Some(vec![worldwide_id]),
    }
}

fn dedupe(countries: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(countries.len());
    for country in countries {
        if !seen.contains(&country) {
            seen.push(country);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn accessible_when_user_has_no_country() {
        let (worldwide, _, other) = ids();
        assert!(program_accessible_to_user(
            worldwide,
            None,
            Some(&[other])
        ));
    }

    #[test]
    fn accessible_when_program_declares_no_countries() {
        let (worldwide, user_country, _) = ids();
        assert!(program_accessible_to_user(worldwide, Some(user_country), None));
        assert!(program_accessible_to_user(
            worldwide,
            Some(user_country),
            Some(&[])
        ));
    }

    #[test]
    fn accessible_via_worldwide_marker_or_user_country() {
        let (worldwide, user_country, other) = ids();
        assert!(program_accessible_to_user(
            worldwide,
            Some(user_country),
            Some(&[other, worldwide])
        ));
        assert!(program_accessible_to_user(
            worldwide,
            Some(user_country),
            Some(&[other, user_country])
        ));
    }

    #[test]
    fn inaccessible_when_country_sets_are_disjoint() {
        let (worldwide, user_country, other) = ids();
        assert!(!program_accessible_to_user(
            worldwide,
            Some(user_country),
            Some(&[other])
        ));
    }

    #[test]
    fn default_requires_worldwide() {
        let (worldwide, _, other) = ids();
        assert!(default_program_is_worldwide(worldwide, None));
        assert!(default_program_is_worldwide(worldwide, Some(&[])));
        assert!(default_program_is_worldwide(worldwide, Some(&[other, worldwide])));
        assert!(!default_program_is_worldwide(worldwide, Some(&[other])));
    }

    #[test]
    fn authenticated_non_admin_with_country_gets_the_ceiling() {
        let (worldwide, user_country, other) = ids();
        // Whatever was requested, the filter is exactly [user country, worldwide].
        let resolved = resolve_available_countries(
            worldwide,
            true,
            false,
            Some(user_country),
            Some(vec![other, other]),
        );
        assert_eq!(resolved, Some(vec![user_country, worldwide]));

        let resolved = resolve_available_countries(worldwide, true, false, Some(user_country), None);
        assert_eq!(resolved, Some(vec![user_country, worldwide]));
    }

    #[test]
    fn admin_without_request_is_unrestricted() {
        let (worldwide, _, _) = ids();
        assert_eq!(
            resolve_available_countries(worldwide, true, true, None, None),
            None
        );
        assert_eq!(
            resolve_available_countries(worldwide, true, true, None, Some(Vec::new())),
            None
        );
    }

    #[test]
    fn anonymous_defaults_to_worldwide_only() {
        let (worldwide, _, _) = ids();
        assert_eq!(
            resolve_available_countries(worldwide, false, false, None, None),
            Some(vec![worldwide])
        );
    }

    #[test]
    fn explicit_request_is_deduplicated_and_returned_verbatim() {
        let (worldwide, a, b) = ids();
        let resolved = resolve_available_countries(
            worldwide,
            true,
            true,
            None,
            Some(vec![a, b, a, b]),
        );
        assert_eq!(resolved, Some(vec![a, b]));

        // Authenticated non-admin without a known country also keeps their request.
        let resolved =
            resolve_available_countries(worldwide, true, false, None, Some(vec![b, a]));
        assert_eq!(resolved, Some(vec![b, a]));
    }
}

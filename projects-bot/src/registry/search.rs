//! Project lookup and ranking.

use projects_shared::Project;

/// Result of resolving a search query against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMatch {
    /// Exactly one project matched.
    Resolved(Project),
    /// Several projects matched, best match first.
    Ambiguous(Vec<Project>),
    /// Nothing matched.
    Nothing,
}

/// Case-insensitive string equality.
pub(crate) fn same_text(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Resolve `query` against `projects`, which must be in store enumeration order.
///
/// A query equal to a project's id or name selects that project outright.
/// Otherwise each whitespace-separated token scores one point for a project
/// when it equals the id or occurs anywhere in the name (both
/// case-insensitive). Projects scoring zero are dropped; the rest are ordered
/// by descending score, keeping enumeration order among equal scores.
pub fn rank(mut projects: Vec<Project>, query: &str) -> SearchMatch {
    let query = query.trim();

    if let Some(exact) = projects
        .iter()
        .position(|p| same_text(&p.id, query) || same_text(&p.name, query))
    {
        return SearchMatch::Resolved(projects.swap_remove(exact));
    }

    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

    let mut scored: Vec<(usize, Project)> = projects
        .into_iter()
        .filter_map(|project| {
            let name = project.name.to_lowercase();
            let id = project.id.to_lowercase();
            let score = tokens
                .iter()
                .filter(|token| **token == id || name.contains(token.as_str()))
                .count();
            (score > 0).then_some((score, project))
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|(a, _), (b, _)| b.cmp(a));

    let mut ranked: Vec<Project> = scored.into_iter().map(|(_, project)| project).collect();
    match ranked.len() {
        0 => SearchMatch::Nothing,
        1 => SearchMatch::Resolved(ranked.remove(0)),
        _ => SearchMatch::Ambiguous(ranked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, name: &str) -> Project {
        let mut project = Project::new(name, "", 1, 1);
        project.id = id.to_string();
        project
    }

    fn names(result: &SearchMatch) -> Vec<&str> {
        match result {
            SearchMatch::Resolved(p) => vec![p.name.as_str()],
            SearchMatch::Ambiguous(ps) => ps.iter().map(|p| p.name.as_str()).collect(),
            SearchMatch::Nothing => vec![],
        }
    }

    fn catalog() -> Vec<Project> {
        vec![
            project("id-1", "Fancy Launcher"),
            project("id-2", "Launcher Tools"),
            project("id-3", "Fancy Launcher Tools"),
            project("id-4", "Sound Pack"),
        ]
    }

    #[test]
    fn test_exact_name_bypasses_ranking() {
        let result = rank(catalog(), "launcher tools");

        assert_eq!(names(&result), vec!["Launcher Tools"]);
        assert!(matches!(result, SearchMatch::Resolved(_)));
    }

    #[test]
    fn test_exact_id_bypasses_ranking() {
        let result = rank(catalog(), "ID-4");

        assert_eq!(names(&result), vec!["Sound Pack"]);
    }

    #[test]
    fn test_orders_by_descending_match_count() {
        let result = rank(catalog(), "fancy tools");

        assert_eq!(
            names(&result),
            vec!["Fancy Launcher Tools", "Fancy Launcher", "Launcher Tools"]
        );
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let result = rank(catalog(), "launcher");

        assert_eq!(
            names(&result),
            vec!["Fancy Launcher", "Launcher Tools", "Fancy Launcher Tools"]
        );
    }

    #[test]
    fn test_zero_match_projects_are_dropped() {
        let result = rank(catalog(), "sound zzz");

        assert_eq!(names(&result), vec!["Sound Pack"]);
        assert!(matches!(result, SearchMatch::Resolved(_)));
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let result = rank(catalog(), "SOUND");

        assert_eq!(names(&result), vec!["Sound Pack"]);
    }

    #[test]
    fn test_token_equal_to_id_counts() {
        let result = rank(catalog(), "id-2 fancy");

        assert_eq!(
            names(&result),
            vec!["Fancy Launcher", "Launcher Tools", "Fancy Launcher Tools"]
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(rank(catalog(), "quantum"), SearchMatch::Nothing);
        assert_eq!(rank(catalog(), "   "), SearchMatch::Nothing);
        assert_eq!(rank(Vec::new(), "anything"), SearchMatch::Nothing);
    }
}

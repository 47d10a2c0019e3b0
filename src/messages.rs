use crate::leetcode::{Category, Problem, ProblemSummary};

fn headline(problem: &Problem) -> String {
    match &problem.frontend_id {
        Some(id) => format!("{id}. {} ({})", problem.title, problem.difficulty),
        None => format!("{} ({})", problem.title, problem.difficulty),
    }
}

/// Body of the daily push and the `/today` reply.
pub fn daily_problem(problem: &Problem) -> String {
    format!(
        "## LeetCode 每日一题\n### {}\n---\n{}\n---\n🔗 {}",
        headline(problem),
        problem.content,
        problem.url()
    )
}

pub fn random_problem(category: Category, problem: &Problem) -> String {
    format!(
        "## LeetCode 随机题 ({})\n### {}\n---\n{}\n---\n🔗 {}",
        category.label(),
        headline(problem),
        problem.content,
        problem.url()
    )
}

/// Degraded `/random` reply used when the statement lookup fails: the
/// pick still goes out, as a headline plus link.
pub fn random_problem_link(category: Category, problem: &ProblemSummary) -> String {
    format!(
        "## LeetCode 随机题 ({})\n### {} ({})\n🔗 {}",
        category.label(),
        problem.title,
        problem.difficulty,
        problem.url()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(frontend_id: Option<&str>) -> Problem {
        Problem {
            frontend_id: frontend_id.map(str::to_owned),
            title: "两数之和".to_owned(),
            difficulty: "Easy".to_owned(),
            slug: "two-sum".to_owned(),
            content: "<p>statement</p>".to_owned(),
        }
    }

    #[test]
    fn daily_message_carries_id_statement_and_link() {
        let text = daily_problem(&problem(Some("1")));
        assert!(text.contains("### 1. 两数之和 (Easy)"));
        assert!(text.contains("<p>statement</p>"));
        assert!(text.contains("https://leetcode.cn/problems/two-sum"));
    }

    #[test]
    fn headline_omits_a_missing_id() {
        let text = random_problem(Category::Hot, &problem(None));
        assert!(text.contains("### 两数之和 (Easy)"));
        assert!(text.contains("(HOT 100)"));
    }
}

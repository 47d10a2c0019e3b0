use miette::{IntoDiagnostic, Result};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::*;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use xorshift::{Rng, SeedableRng, Xorshift128};

pub const BASE: &str = "https://leetcode.cn";
pub const GRAPHQL_ENDPOINT: &str = "https://leetcode.cn/graphql";

/// Page size of a collection listing request.
pub const LISTING_LIMIT: u64 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Substituted when the provider omits the statement body.
const STATEMENT_FALLBACK: &str = "（本题暂无题面描述）";

const QUERY_TODAY: &str = "
    query questionOfToday {
        todayRecord {
            question {
                questionId
                frontendQuestionId: questionFrontendId
                difficulty
                translatedTitle
                titleSlug
            }
        }
    }
";

const QUERY_TRANSLATIONS: &str = "
    query questionTranslations($titleSlug: String!) {
        question(titleSlug: $titleSlug) {
            translatedTitle
            translatedContent
        }
    }
";

const QUERY_PROBLEMSET: &str = "
    query problemsetQuestionList($categorySlug: String, $limit: Int, $skip: Int, $filters: QuestionListFilterInput) {
        problemsetQuestionList(categorySlug: $categorySlug, limit: $limit, skip: $skip, filters: $filters) {
            questions {
                titleSlug
                translatedTitle
                difficulty
            }
        }
    }
";

/// Failure taxonomy of the problem source. Callers must be able to tell a
/// dead upstream apart from a well-formed answer that simply has no data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not reach LeetCode: {0}")]
    Transport(reqwest::Error),
    #[error("LeetCode answered with a malformed response: {0}")]
    Protocol(String),
    #[error("LeetCode answered with no matching data")]
    Empty,
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Error::Protocol(error.to_string())
        } else {
            Error::Transport(error)
        }
    }
}

/// A provider-curated problem collection.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Category {
    Hot,
    All,
    Sql,
    Interview,
    Classic75,
}

impl Category {
    /// Maps a free-text token to a collection. Unrecognized (or absent)
    /// tokens fall back to [`Category::Hot`].
    pub fn from_token(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "all" => Category::All,
            "sql" => Category::Sql,
            "interview" => Category::Interview,
            "75" => Category::Classic75,
            _ => Category::Hot,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::Hot => "leetcode-curated-algo-100",
            Category::All => "",
            Category::Sql => "sql-50",
            Category::Interview => "top-interview-questions",
            Category::Classic75 => "leetcode-75",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Hot => "HOT 100",
            Category::All => "all problems",
            Category::Sql => "SQL 50",
            Category::Interview => "top interview",
            Category::Classic75 => "LeetCode 75",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq, Hash)]
pub struct ProblemSummary {
    #[serde(rename = "titleSlug")]
    pub slug: String,
    #[serde(rename = "translatedTitle")]
    pub title: String,
    pub difficulty: String,
}

/// A fully resolved problem, ready for formatting.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Problem {
    pub frontend_id: Option<String>,
    pub title: String,
    pub difficulty: String,
    pub slug: String,
    pub content: String,
}

impl ProblemSummary {
    pub fn url(&self) -> String {
        format!("{BASE}/problems/{}", self.slug)
    }

    pub fn into_problem(self, content: String) -> Problem {
        Problem {
            frontend_id: None,
            title: self.title,
            difficulty: self.difficulty,
            slug: self.slug,
            content,
        }
    }
}

impl Problem {
    pub fn url(&self) -> String {
        format!("{BASE}/problems/{}", self.slug)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: serde_json::Value,
    #[serde(rename = "operationName")]
    operation_name: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct TodayData {
    #[serde(rename = "todayRecord")]
    today_record: Vec<TodayRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct TodayRecord {
    question: TodayQuestion,
}

#[derive(Debug, Clone, Deserialize)]
struct TodayQuestion {
    #[serde(rename = "frontendQuestionId")]
    frontend_id: Option<String>,
    difficulty: String,
    #[serde(rename = "translatedTitle")]
    title: String,
    #[serde(rename = "titleSlug")]
    slug: String,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionData {
    question: Option<QuestionContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuestionContent {
    #[serde(rename = "translatedContent")]
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProblemsetData {
    #[serde(rename = "problemsetQuestionList")]
    listing: Option<ProblemListing>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProblemListing {
    questions: Vec<ProblemSummary>,
}

fn today_query() -> GraphQlRequest {
    GraphQlRequest {
        query: QUERY_TODAY,
        variables: serde_json::json!({}),
        operation_name: "questionOfToday",
    }
}

fn content_query(slug: &str) -> GraphQlRequest {
    GraphQlRequest {
        query: QUERY_TRANSLATIONS,
        variables: serde_json::json!({ "titleSlug": slug }),
        operation_name: "questionTranslations",
    }
}

fn listing_query(category: Category) -> GraphQlRequest {
    GraphQlRequest {
        query: QUERY_PROBLEMSET,
        variables: serde_json::json!({
            "categorySlug": category.slug(),
            "limit": LISTING_LIMIT,
            "skip": 0,
            "filters": {},
        }),
        operation_name: "problemsetQuestionList",
    }
}

fn extract<T>(envelope: GraphQlResponse<T>) -> Result<T, Error> {
    if envelope.errors.is_some() {
        return Err(Error::Protocol("response carries an errors field".to_owned()));
    }
    envelope
        .data
        .ok_or_else(|| Error::Protocol("response is missing the data field".to_owned()))
}

fn first_today_question(data: TodayData) -> Result<TodayQuestion, Error> {
    data.today_record
        .into_iter()
        .next()
        .map(|record| record.question)
        .ok_or(Error::Empty)
}

fn listing_questions(data: ProblemsetData) -> Result<Vec<ProblemSummary>, Error> {
    data.listing
        .map(|listing| listing.questions)
        .ok_or(Error::Empty)
}

fn statement_or_fallback(data: QuestionData) -> Result<String, Error> {
    let question = data
        .question
        .ok_or_else(|| Error::Protocol("response is missing the question field".to_owned()))?;
    Ok(match question.content {
        Some(content) if !content.trim().is_empty() => content,
        _ => STATEMENT_FALLBACK.to_owned(),
    })
}

/// Uniform random choice from a listing. Returns `None` iff the listing
/// is empty, which callers report differently from a fetch failure.
pub fn pick_random(problems: &[ProblemSummary]) -> Option<&ProblemSummary> {
    if problems.is_empty() {
        return None;
    }
    let unix_time_s = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let states = [unix_time_s, problems.len() as u64];
    let mut rng: Xorshift128 = SeedableRng::from_seed(&states[..]);
    problems.get((rng.next_u64() as usize) % problems.len())
}

#[derive(Debug, Clone)]
pub struct Client {
    reqwest_client: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(BASE));
        headers.insert(ORIGIN, HeaderValue::from_static(BASE));

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .into_diagnostic()?;
        Ok(Self { reqwest_client })
    }

    async fn call<T>(&self, request: &GraphQlRequest) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = self
            .reqwest_client
            .post(GRAPHQL_ENDPOINT)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let envelope = response.json::<GraphQlResponse<T>>().await?;
        extract(envelope)
    }

    /// Resolves today's designated problem, statement included.
    pub async fn fetch_today(&self) -> Result<Problem, Error> {
        let question = first_today_question(self.call(&today_query()).await?)?;
        let content = self.problem_content(&question.slug).await?;
        Ok(Problem {
            frontend_id: question.frontend_id,
            title: question.title,
            difficulty: question.difficulty,
            slug: question.slug,
            content,
        })
    }

    /// Lists up to [`LISTING_LIMIT`] problems of a collection. An empty
    /// vector means the collection legitimately has no entries.
    pub async fn fetch_by_category(&self, category: Category) -> Result<Vec<ProblemSummary>, Error> {
        listing_questions(self.call(&listing_query(category)).await?)
    }

    /// Looks up the statement body of a single problem by slug.
    pub async fn problem_content(&self, slug: &str) -> Result<String, Error> {
        statement_or_fallback(self.call(&content_query(slug)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_category_tokens_fall_back_to_hot() {
        assert_eq!(Category::from_token("zz"), Category::Hot);
        assert_eq!(Category::from_token(""), Category::Hot);
        assert_eq!(Category::from_token("hot"), Category::Hot);
        assert_eq!(Category::from_token(" SQL "), Category::Sql);
        assert_eq!(Category::from_token("75"), Category::Classic75);
        assert_eq!(Category::from_token("Interview"), Category::Interview);
        assert_eq!(Category::from_token("all"), Category::All);
    }

    #[test]
    fn envelope_with_errors_field_is_a_protocol_failure() {
        let envelope: GraphQlResponse<TodayData> =
            serde_json::from_str(r#"{"data": null, "errors": [{"message": "boom"}]}"#).unwrap();
        assert!(matches!(extract(envelope), Err(Error::Protocol(_))));
    }

    #[test]
    fn envelope_without_data_is_a_protocol_failure() {
        let envelope: GraphQlResponse<TodayData> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(extract(envelope), Err(Error::Protocol(_))));
    }

    #[test]
    fn empty_today_record_is_an_empty_result() {
        let data: TodayData = serde_json::from_str(r#"{"todayRecord": []}"#).unwrap();
        assert!(matches!(first_today_question(data), Err(Error::Empty)));
    }

    #[test]
    fn today_record_yields_the_first_question() {
        let data: TodayData = serde_json::from_str(
            r#"{"todayRecord": [{"question": {
                "frontendQuestionId": "1",
                "difficulty": "Easy",
                "translatedTitle": "两数之和",
                "titleSlug": "two-sum"
            }}]}"#,
        )
        .unwrap();
        let question = first_today_question(data).unwrap();
        assert_eq!(question.slug, "two-sum");
        assert_eq!(question.frontend_id.as_deref(), Some("1"));
    }

    #[test]
    fn missing_listing_is_an_empty_result_but_zero_entries_are_not() {
        let absent: ProblemsetData =
            serde_json::from_str(r#"{"problemsetQuestionList": null}"#).unwrap();
        assert!(matches!(listing_questions(absent), Err(Error::Empty)));

        let zero: ProblemsetData =
            serde_json::from_str(r#"{"problemsetQuestionList": {"questions": []}}"#).unwrap();
        assert_eq!(listing_questions(zero).unwrap(), Vec::new());
    }

    #[test]
    fn blank_statement_gets_the_fallback_notice() {
        let null_content: QuestionData =
            serde_json::from_str(r#"{"question": {"translatedContent": null}}"#).unwrap();
        assert_eq!(statement_or_fallback(null_content).unwrap(), STATEMENT_FALLBACK);

        let blank: QuestionData =
            serde_json::from_str(r#"{"question": {"translatedContent": "  \n"}}"#).unwrap();
        assert_eq!(statement_or_fallback(blank).unwrap(), STATEMENT_FALLBACK);

        let present: QuestionData =
            serde_json::from_str(r#"{"question": {"translatedContent": "<p>statement</p>"}}"#)
                .unwrap();
        assert_eq!(statement_or_fallback(present).unwrap(), "<p>statement</p>");
    }

    #[test]
    fn missing_question_is_a_protocol_failure() {
        let data: QuestionData = serde_json::from_str(r#"{"question": null}"#).unwrap();
        assert!(matches!(statement_or_fallback(data), Err(Error::Protocol(_))));
    }

    #[test]
    fn pick_random_is_none_only_for_an_empty_listing() {
        assert!(pick_random(&[]).is_none());

        let problems = vec![
            ProblemSummary {
                slug: "two-sum".to_owned(),
                title: "两数之和".to_owned(),
                difficulty: "Easy".to_owned(),
            },
            ProblemSummary {
                slug: "add-two-numbers".to_owned(),
                title: "两数相加".to_owned(),
                difficulty: "Medium".to_owned(),
            },
        ];
        let picked = pick_random(&problems).unwrap();
        assert!(problems.contains(picked));

        let single = &problems[..1];
        assert_eq!(pick_random(single).unwrap(), &problems[0]);
    }
}

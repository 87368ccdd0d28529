use std::collections::HashSet;

use crate::config::Config;
use crate::error::{PythawError, Result};

/// A built-in call-pattern rule with its help text.
#[derive(Debug)]
pub struct BuiltinRule {
    pub code: &'static str,
    pub pattern: &'static str,
    pub message: &'static str,
    pub what: &'static str,
    pub why: &'static str,
    pub example: &'static str,
}

/// A rule declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRule {
    pub code: String,
    pub pattern: String,
    pub message: String,
}

/// A call-pattern rule. Both kinds match by exact dotted-name equality on
/// the resolved qualified name of a callee.
#[derive(Debug, Clone)]
pub enum Rule {
    Builtin(&'static BuiltinRule),
    Custom(CustomRule),
}

impl Rule {
    pub fn code(&self) -> &str {
        match self {
            Rule::Builtin(rule) => rule.code,
            Rule::Custom(rule) => &rule.code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Rule::Builtin(rule) => rule.message,
            Rule::Custom(rule) => &rule.message,
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Rule::Builtin(rule) => rule.pattern,
            Rule::Custom(rule) => &rule.pattern,
        }
    }

    pub fn matches(&self, qualified_name: &str) -> bool {
        self.pattern() == qualified_name
    }
}

pub static BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        code: "PW001",
        pattern: "boto3.client",
        message: "boto3.client() should be called at module scope",
        what: "Detects `boto3.client()` calls reachable from Lambda handler functions. \
               These calls create AWS service clients, which involves HTTP connection \
               setup and credential resolution.",
        why: "Creating a boto3 client inside the handler means it is re-created on \
              every invocation. Client construction is expensive because it resolves \
              credentials, discovers endpoints, and sets up HTTP connections. Moving \
              it to module scope allows AWS Lambda to reuse the client across warm \
              invocations, avoiding this overhead.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   client = boto3.client('s3')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  client = boto3.client('s3')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   client.get_object(...)\n",
    },
    BuiltinRule {
        code: "PW002",
        pattern: "boto3.resource",
        message: "boto3.resource() should be called at module scope",
        what: "Detects `boto3.resource()` calls reachable from Lambda handler functions. \
               These calls create AWS high-level resource objects, which involves \
               HTTP connection setup and credential resolution.",
        why: "Creating a boto3 resource inside the handler means it is re-created on \
              every invocation. Moving it to module scope allows AWS Lambda to reuse \
              the resource across warm invocations, significantly reducing cold-start \
              latency.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   s3 = boto3.resource('s3')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  s3 = boto3.resource('s3')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   s3.Bucket('my-bucket').download_file(...)\n",
    },
    BuiltinRule {
        code: "PW003",
        pattern: "boto3.Session",
        message: "boto3.Session() should be called at module scope",
        what: "Detects `boto3.Session()` calls reachable from Lambda handler functions. \
               These calls create AWS sessions, which involves credential resolution \
               and configuration loading.",
        why: "Creating a boto3 Session inside the handler means it is re-created on \
              every invocation. Session construction is expensive because it reads \
              configuration files and resolves credentials. Moving it to module scope \
              allows AWS Lambda to reuse the session across warm invocations, avoiding \
              this overhead.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   session = boto3.Session()  # Created every invocation\n\
                  \n\
                  # OK\n\
                  session = boto3.Session()  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   client = session.client('s3')\n",
    },
    BuiltinRule {
        code: "PW004",
        pattern: "pymysql.connect",
        message: "pymysql.connect() should be called at module scope",
        what: "Detects `pymysql.connect()` calls reachable from Lambda handler functions. \
               These calls establish MySQL database connections, which involves \
               TCP handshake and authentication.",
        why: "Creating a MySQL connection inside the handler means a TCP handshake and \
              database authentication are performed on every invocation. Moving it to \
              module scope allows AWS Lambda to reuse the connection across warm \
              invocations, avoiding this overhead.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   conn = pymysql.connect(host='...')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  conn = pymysql.connect(host='...')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   conn.cursor()\n",
    },
    BuiltinRule {
        code: "PW005",
        pattern: "psycopg2.connect",
        message: "psycopg2.connect() should be called at module scope",
        what: "Detects `psycopg2.connect()` calls reachable from Lambda handler functions. \
               These calls establish PostgreSQL database connections, which involves \
               TCP handshake and authentication.",
        why: "Creating a PostgreSQL connection inside the handler means a TCP handshake \
              and database authentication are performed on every invocation. Moving it \
              to module scope allows AWS Lambda to reuse the connection across warm \
              invocations, avoiding this overhead.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   conn = psycopg2.connect(dsn='...')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  conn = psycopg2.connect(dsn='...')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   conn.cursor()\n",
    },
    BuiltinRule {
        code: "PW006",
        pattern: "redis.Redis",
        message: "redis.Redis() should be called at module scope",
        what: "Detects `redis.Redis()` calls reachable from Lambda handler functions. \
               These calls create Redis clients whose connections involve TCP \
               handshake and authentication.",
        why: "Creating a Redis client inside the handler means its connection pool is \
              re-created on every invocation. Moving it to module scope allows AWS \
              Lambda to reuse the pool across warm invocations, avoiding repeated \
              connection setup.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   r = redis.Redis(host='...')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  r = redis.Redis(host='...')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   r.get('key')\n",
    },
    BuiltinRule {
        code: "PW007",
        pattern: "redis.StrictRedis",
        message: "redis.StrictRedis() should be called at module scope",
        what: "Detects `redis.StrictRedis()` calls reachable from Lambda handler \
               functions. StrictRedis is an alias of the Redis client; constructing \
               it sets up a connection pool.",
        why: "Creating a StrictRedis client inside the handler means its connection \
              pool is re-created on every invocation. Moving it to module scope allows \
              AWS Lambda to reuse the pool across warm invocations, avoiding repeated \
              connection setup.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   r = redis.StrictRedis(host='...')  # Created every invocation\n\
                  \n\
                  # OK\n\
                  r = redis.StrictRedis(host='...')  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   r.get('key')\n",
    },
    BuiltinRule {
        code: "PW008",
        pattern: "httpx.Client",
        message: "httpx.Client() should be called at module scope",
        what: "Detects `httpx.Client()` calls reachable from Lambda handler functions. \
               These calls build HTTP clients with their own connection pools.",
        why: "Creating an httpx client inside the handler means its connection pool is \
              re-created on every invocation, losing keep-alive connections. Moving it \
              to module scope allows AWS Lambda to reuse connections across warm \
              invocations.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   client = httpx.Client()  # Created every invocation\n\
                  \n\
                  # OK\n\
                  client = httpx.Client()  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   client.get('https://...')\n",
    },
    BuiltinRule {
        code: "PW009",
        pattern: "requests.Session",
        message: "requests.Session() should be called at module scope",
        what: "Detects `requests.Session()` calls reachable from Lambda handler \
               functions. Sessions carry connection pools and keep-alive state.",
        why: "Creating a requests Session inside the handler means its connection pool \
              is re-created on every invocation, losing keep-alive connections. Moving \
              it to module scope allows AWS Lambda to reuse connections across warm \
              invocations.",
        example: "# NG\n\
                  def handler(event, context):\n\
                  \x20   session = requests.Session()  # Created every invocation\n\
                  \n\
                  # OK\n\
                  session = requests.Session()  # Created once at module load\n\
                  \n\
                  def handler(event, context):\n\
                  \x20   session.get('https://...')\n",
    },
];

/// The set of rules for a run: built-ins plus configured custom rules,
/// with an enabled subset from the `select` configuration.
pub struct RuleRegistry {
    rules: Vec<Rule>,
    enabled: HashSet<String>,
}

impl RuleRegistry {
    /// Build the registry from configuration. Custom rules get codes in
    /// declaration order (`PWC001`, `PWC002`, ...). An unknown code in
    /// `select` is a configuration error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut rules: Vec<Rule> = BUILTIN_RULES.iter().map(Rule::Builtin).collect();

        for (i, custom) in config.custom_rules.iter().enumerate() {
            if custom.pattern.is_empty() {
                return Err(PythawError::Config(
                    "custom rule pattern must not be empty".to_string(),
                ));
            }
            rules.push(Rule::Custom(CustomRule {
                code: format!("PWC{:03}", i + 1),
                pattern: custom.pattern.clone(),
                message: custom.message.clone(),
            }));
        }

        let all_codes: HashSet<String> = rules.iter().map(|r| r.code().to_string()).collect();
        let enabled = match &config.select {
            Some(selection) => {
                for code in selection {
                    if !all_codes.contains(code) {
                        return Err(PythawError::Config(format!("Unknown rule code: {}", code)));
                    }
                }
                selection.iter().cloned().collect()
            }
            None => all_codes,
        };

        Ok(Self { rules, enabled })
    }

    /// Every known rule, enabled or not.
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, code: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.code() == code)
    }

    /// Enabled rules whose pattern equals *qualified_name*. Several rules may
    /// watch the same name; all of them match.
    pub fn matching(&self, qualified_name: &str) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| self.enabled.contains(r.code()) && r.matches(qualified_name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomRuleConfig;

    #[test]
    fn test_builtin_patterns() {
        let registry = RuleRegistry::from_config(&Config::default()).unwrap();
        let matched = registry.matching("boto3.client");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].code(), "PW001");

        assert!(registry.matching("boto3.clients").is_empty());
        assert!(registry.matching("client").is_empty());
        assert_eq!(registry.matching("requests.Session")[0].code(), "PW009");
    }

    #[test]
    fn test_custom_rules_get_sequential_codes() {
        let config = Config {
            custom_rules: vec![
                CustomRuleConfig {
                    pattern: "sqlalchemy.create_engine".into(),
                    message: "create_engine() should be called at module scope".into(),
                },
                CustomRuleConfig {
                    pattern: "pymongo.MongoClient".into(),
                    message: "MongoClient() should be called at module scope".into(),
                },
            ],
            ..Config::default()
        };
        let registry = RuleRegistry::from_config(&config).unwrap();
        assert_eq!(registry.matching("sqlalchemy.create_engine")[0].code(), "PWC001");
        assert_eq!(registry.matching("pymongo.MongoClient")[0].code(), "PWC002");
    }

    #[test]
    fn test_select_restricts_matching() {
        let config = Config {
            select: Some(vec!["PW002".into()]),
            ..Config::default()
        };
        let registry = RuleRegistry::from_config(&config).unwrap();
        assert!(registry.matching("boto3.client").is_empty());
        assert_eq!(registry.matching("boto3.resource").len(), 1);
        // Disabled rules are still known for help lookup.
        assert!(registry.get("PW001").is_some());
    }

    #[test]
    fn test_unknown_select_code_is_config_error() {
        let config = Config {
            select: Some(vec!["PW999".into()]),
            ..Config::default()
        };
        assert!(RuleRegistry::from_config(&config).is_err());
    }

    #[test]
    fn test_multiple_rules_on_one_name() {
        let config = Config {
            custom_rules: vec![CustomRuleConfig {
                pattern: "boto3.client".into(),
                message: "project policy: construct clients in app.clients".into(),
            }],
            ..Config::default()
        };
        let registry = RuleRegistry::from_config(&config).unwrap();
        let matched = registry.matching("boto3.client");
        let codes: Vec<_> = matched.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["PW001", "PWC001"]);
    }
}

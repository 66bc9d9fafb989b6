//! Prompt templates
//!
//! Prompts render guidance text for clients. The two guide prompts render a
//! structured JSON document; the rest render short task instructions.

use chainpay::{ChainpayError, EngineConfig, Result};
use serde_json::{json, Map, Value};

type Arguments = Map<String, Value>;

/// A prompt argument as listed by `prompts/list`
#[derive(Debug, Clone, Copy)]
pub struct PromptArgument {
    /// Argument name
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
    /// Whether `prompts/get` rejects its absence
    pub required: bool,
}

/// A prompt definition with its renderer
#[derive(Clone, Copy)]
pub struct Prompt {
    /// Prompt name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Accepted arguments
    pub arguments: &'static [PromptArgument],
    render: fn(&Arguments, &EngineConfig) -> Rendered,
}

struct Rendered {
    description: String,
    text: String,
}

const PROMPTS: &[Prompt] = &[
    Prompt {
        name: "balance_query",
        description: "Check the balance of an address",
        arguments: &[
            PromptArgument {
                name: "address",
                description: "Address to query",
                required: true,
            },
            PromptArgument {
                name: "network",
                description: "Network name",
                required: false,
            },
        ],
        render: render_balance_query,
    },
    Prompt {
        name: "transaction_send",
        description: "Send a native or token transfer",
        arguments: &[
            PromptArgument {
                name: "to_address",
                description: "Recipient address",
                required: true,
            },
            PromptArgument {
                name: "amount",
                description: "Amount in token units",
                required: true,
            },
            PromptArgument {
                name: "network",
                description: "Network name",
                required: false,
            },
            PromptArgument {
                name: "token_symbol",
                description: "Token symbol, native currency when omitted",
                required: false,
            },
        ],
        render: render_transaction_send,
    },
    Prompt {
        name: "wallet_management",
        description: "Create, import, list or switch wallets",
        arguments: &[PromptArgument {
            name: "operation",
            description: "create, import, list, switch or remove",
            required: true,
        }],
        render: render_wallet_management,
    },
    Prompt {
        name: "network_info",
        description: "Inspect a network and its connectivity",
        arguments: &[PromptArgument {
            name: "network",
            description: "Network name",
            required: false,
        }],
        render: render_network_info,
    },
    Prompt {
        name: "wallet_architecture_guide",
        description: "Agent and user wallet types and when each applies",
        arguments: &[PromptArgument {
            name: "scenario",
            description: "automation or user_interaction",
            required: false,
        }],
        render: render_architecture_guide,
    },
    Prompt {
        name: "wallet_selection_guide",
        description: "Pick the right wallet type for an operation",
        arguments: &[PromptArgument {
            name: "operation_type",
            description: "transfer or query",
            required: false,
        }],
        render: render_selection_guide,
    },
];

fn arg<'a>(args: &'a Arguments, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn arg_or<'a>(args: &'a Arguments, name: &str, default: &'a str) -> &'a str {
    arg(args, name).unwrap_or(default)
}

fn render_balance_query(args: &Arguments, config: &EngineConfig) -> Rendered {
    let address = arg_or(args, "address", "");
    let network = arg_or(args, "network", &config.default_network);
    Rendered {
        description: format!("Balance of {address} on {network}"),
        text: format!(
            "Check the balance of {address} on {network}. Call get_balance with \
             address=\"{address}\" and network=\"{network}\", then report the native balance \
             and every token balance. Entries with an error_kind could not be read; say so \
             instead of reporting zero."
        ),
    }
}

fn render_transaction_send(args: &Arguments, config: &EngineConfig) -> Rendered {
    let to = arg_or(args, "to_address", "");
    let amount = arg_or(args, "amount", "");
    let network = arg_or(args, "network", &config.default_network);
    let asset = arg(args, "token_symbol")
        .map(str::to_string)
        .unwrap_or_else(|| "the native currency".to_string());
    Rendered {
        description: format!("Send {amount} {asset} to {to}"),
        text: format!(
            "Send {amount} of {asset} to {to} on {network}.\n\
             1. Call validate_address on the recipient.\n\
             2. Call estimate_gas_fees and show the fee to the user.\n\
             3. Only after the user confirms, call send_transaction.\n\
             4. Track the result with get_transaction_status.\n\
             Transfers above {max} are rejected.",
            max = config.max_transaction_value
        ),
    }
}

fn render_wallet_management(args: &Arguments, _config: &EngineConfig) -> Rendered {
    let operation = arg_or(args, "operation", "list");
    let steps = match operation {
        "create" => "Call create_wallet with a label to generate and register a key pair, or \
                     create_agent_wallet for an automation wallet. Tell the user to store the \
                     private key; it is shown once.",
        "import" => "Call set_user_wallet with the private key and an optional label. Never \
                     repeat the key back to the user.",
        "switch" => "Call list_wallets, then switch_wallet with the chosen label.",
        "remove" => "Call remove_wallet with the label. Funds stay on chain; only the session \
                     copy of the key is forgotten.",
        _ => "Call list_wallets and show each label, address, type and which one is current.",
    };
    Rendered {
        description: format!("Wallet management: {operation}"),
        text: steps.to_string(),
    }
}

fn render_network_info(args: &Arguments, config: &EngineConfig) -> Rendered {
    let network = arg_or(args, "network", &config.default_network);
    Rendered {
        description: format!("Network details for {network}"),
        text: format!(
            "Call get_network_info with network=\"{network}\" and report the chain id, native \
             token, explorer and whether the RPC endpoint answered. Use list_networks to show \
             alternatives and get_supported_tokens for the tokens available there."
        ),
    }
}

fn render_architecture_guide(args: &Arguments, _config: &EngineConfig) -> Rendered {
    let scenario = arg_or(args, "scenario", "automation");
    let workflow = if scenario == "user_interaction" {
        json!([
            "set_user_wallet",
            "get_balance",
            "send_transaction after user confirmation",
            "get_transaction_status",
        ])
    } else {
        json!([
            "create_agent_wallet",
            "get_agent_wallet_balance",
            "send_from_agent_wallet",
            "get_transaction_status",
        ])
    };
    let guide = json!({
        "scenario": scenario,
        "wallet_types": {
            "agent": {
                "purpose": "Automated operations that need no user confirmation",
                "features": [
                    "Key generated by the server",
                    "Suited to scheduled and batch transfers",
                ],
                "tools": [
                    "create_agent_wallet",
                    "get_agent_wallet_balance",
                    "send_from_agent_wallet",
                    "list_agent_wallets",
                ],
            },
            "user": {
                "purpose": "Operations the user confirms explicitly",
                "features": [
                    "Key supplied by the user",
                    "Suited to one-off and large transfers",
                ],
                "tools": ["set_user_wallet", "list_user_wallets", "send_transaction"],
            },
        },
        "workflow": workflow,
        "best_practices": [
            "Use agent wallets for small automated amounts",
            "Use user wallets for anything the user must approve",
            "Keys live only for the session; fund agent wallets sparingly",
        ],
    });
    Rendered {
        description: format!("Wallet architecture guide ({scenario})"),
        text: pretty(&guide),
    }
}

fn render_selection_guide(args: &Arguments, _config: &EngineConfig) -> Rendered {
    let operation = arg_or(args, "operation_type", "transfer");
    let recommendation = if operation == "query" {
        json!({
            "agent_wallet": {
                "when_to_use": ["Monitoring automation balances"],
                "tools": ["get_agent_wallet_balance", "list_agent_wallets"],
            },
            "user_wallet": {
                "when_to_use": ["Checking any address the user names"],
                "tools": ["get_balance", "get_transaction_status"],
            },
        })
    } else {
        json!({
            "agent_wallet": {
                "when_to_use": ["Automated or scheduled transfers", "Batches of small transfers"],
                "tools": ["send_from_agent_wallet"],
            },
            "user_wallet": {
                "when_to_use": ["Transfers the user initiates", "Large transfers"],
                "tools": ["send_transaction"],
            },
        })
    };
    let guide = json!({
        "operation_type": operation,
        "recommendations": recommendation,
    });
    Rendered {
        description: format!("Wallet selection guide ({operation})"),
        text: pretty(&guide),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// All prompts
pub fn prompts() -> &'static [Prompt] {
    PROMPTS
}

/// `prompts/list` result
pub fn list() -> Value {
    let prompts: Vec<Value> = PROMPTS
        .iter()
        .map(|p| {
            let arguments: Vec<Value> = p
                .arguments
                .iter()
                .map(|a| json!({ "name": a.name, "description": a.description, "required": a.required }))
                .collect();
            json!({ "name": p.name, "description": p.description, "arguments": arguments })
        })
        .collect();
    json!({ "prompts": prompts })
}

/// `prompts/get` result
pub fn get(name: &str, args: &Arguments, config: &EngineConfig) -> Result<Value> {
    let prompt = PROMPTS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ChainpayError::InvalidArgument {
            name: "name".to_string(),
            reason: format!("unknown prompt '{name}'"),
        })?;

    if let Some(missing) = prompt.arguments.iter().find(|a| a.required && arg(args, a.name).is_none()) {
        return Err(ChainpayError::InvalidArgument {
            name: missing.name.to_string(),
            reason: "required".to_string(),
        });
    }

    let rendered = (prompt.render)(args, config);
    Ok(json!({
        "description": rendered.description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": rendered.text },
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn test_list_names() {
        let listed = list();
        let names: Vec<&str> = listed["prompts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "balance_query",
                "transaction_send",
                "wallet_management",
                "network_info",
                "wallet_architecture_guide",
                "wallet_selection_guide"
            ]
        );
    }

    #[test]
    fn test_balance_query_uses_default_network() {
        let config = EngineConfig::default().with_default_network("base_sepolia");
        let out = get("balance_query", &args(json!({"address": "0xabc"})), &config).unwrap();
        let text = out["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("base_sepolia"));
        assert!(text.contains("0xabc"));
        assert_eq!(out["messages"][0]["role"], "user");
    }

    #[test]
    fn test_required_argument() {
        let err = get("transaction_send", &args(json!({"amount": "1"})), &EngineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("to_address"));
    }

    #[test]
    fn test_unknown_prompt() {
        let err = get("nope", &Arguments::new(), &EngineConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_guides_render_json() {
        let config = EngineConfig::default();
        let out = get("wallet_selection_guide", &args(json!({"operation_type": "query"})), &config).unwrap();
        let text = out["messages"][0]["content"]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["operation_type"], "query");

        let out = get("wallet_architecture_guide", &Arguments::new(), &config).unwrap();
        let text = out["messages"][0]["content"]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["scenario"], "automation");
    }
}

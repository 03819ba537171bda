//! Stage contexts for the three-part generation sequence. Each stage gets a
//! fresh role/goal/backstory plus a task that embeds the raw text of earlier
//! stages; nothing is re-extracted between stages.

use quoteforge_core::pricing::PricingPolicy;
use rust_decimal::Decimal;

/// Prompt material for one generation stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageContext {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub task: String,
    pub expected_output: String,
}

impl StageContext {
    pub fn system_prompt(&self) -> String {
        format!("You are a {role}. {backstory}\nYour goal: {goal}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal)
    }

    pub fn user_prompt(&self) -> String {
        format!("{task}\n\nExpected output: {expected}",
            task = self.task,
            expected = self.expected_output)
    }
}

pub fn scope_analysis(customer_request: &str) -> StageContext {
    StageContext {
        role: "project scope analyst".to_owned(),
        goal: "decompose the customer request into concrete work scope, deliverables, and \
               milestones"
            .to_owned(),
        backstory: "You are a project manager with over ten years of experience. You turn \
                    customer requirements into specific, measurable work items and always \
                    produce clear, practical scope definitions."
            .to_owned(),
        task: format!(
            "Analyze the following customer request and define the work scope.\n\n\
             Request: {customer_request}\n\n\
             Organize the result as JSON with these fields:\n\
             - scope: array of concrete work items\n\
             - deliverables: array of final outputs\n\
             - milestones: array of major completion points\n\
             - assumptions: array of preconditions\n\
             - exclusions: array of work that is not included\n\
             - risks: array of potential risk factors\n\n\
             Keep every item specific and practical. Do not include the client name \
             anywhere; summarize the request content only."
        ),
        expected_output: "a JSON analysis containing scope, deliverables, milestones, \
                          assumptions, exclusions, and risks"
            .to_owned(),
    }
}

pub fn estimation(scope_output: &str, pricing: &PricingPolicy) -> StageContext {
    StageContext {
        role: "estimation specialist".to_owned(),
        goal: "produce a realistic schedule and price from the analyzed work scope".to_owned(),
        backstory: "You are an IT project estimation expert. You weigh scope complexity \
                    against schedule to propose fair prices, always respecting the minimum \
                    subtotal and VAT rules."
            .to_owned(),
        task: format!(
            "Based on the scope analysis below, produce an estimate.\n\n\
             Scope analysis:\n{scope_output}\n\n\
             You must respect the following:\n\
             - minimum subtotal: {min_subtotal} KRW or more\n\
             - VAT rate: {vat_pct}%\n\
             - schedule: delivery_days as a realistic number of days\n\
             - currency: KRW\n\n\
             Price the work according to scope complexity and the schedule.",
            min_subtotal = pricing.min_subtotal(),
            vat_pct = (pricing.vat_rate() * Decimal::from(100)).normalize(),
        ),
        expected_output: "a JSON estimate containing delivery_days and pricing (subtotal, \
                          vat, total, currency)"
            .to_owned(),
    }
}

pub fn proposal_synthesis(
    scope_output: &str,
    estimate_output: &str,
    pricing: &PricingPolicy,
) -> StageContext {
    StageContext {
        role: "proposal writer".to_owned(),
        goal: "write a professional quote document that can be sent to the client as-is"
            .to_owned(),
        backstory: "You are a business document specialist. You write clear, professional \
                    quotes with appropriate disclaimers, in a working-document tone rather \
                    than a marketing one."
            .to_owned(),
        task: format!(
            "Combine the scope analysis and the estimate below into the final quote.\n\n\
             Scope analysis:\n{scope_output}\n\n\
             Estimate:\n{estimate_output}\n\n\
             Produce JSON conforming exactly to this schema:\n\
             {{\n\
               \"project_summary\": \"2-3 sentence overview, request content only, no client name\",\n\
               \"scope\": [\"work item\", ...],\n\
               \"deliverables\": [\"deliverable\", ...],\n\
               \"milestones\": [\"milestone\", ...],\n\
               \"assumptions\": [\"assumption\", ...],\n\
               \"exclusions\": [\"exclusion\", ...],\n\
               \"risks\": [\"risk\", ...],\n\
               \"disclaimer\": \"disclaimer text\",\n\
               \"delivery_days\": number,\n\
               \"pricing\": {{\n\
                 \"subtotal\": number,\n\
                 \"vat\": number,\n\
                 \"total\": number,\n\
                 \"currency\": \"KRW\"\n\
               }}\n\
             }}\n\n\
             The disclaimer must state that this quote is indicative and subject to change \
             once the scope is finalized. The subtotal must be at least {min_subtotal} KRW. \
             Never include the client name in project_summary.",
            min_subtotal = pricing.min_subtotal(),
        ),
        expected_output: "the complete quote as JSON, exactly matching the schema above"
            .to_owned(),
    }
}

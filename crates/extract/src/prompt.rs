/// Per-company extraction instruction, sent ahead of each chunk of a company's details.
pub const EXTRACTION_PROMPT: &str = "\
Extract the key information from the following text and produce it in this format:
Company name
Main business: a 100-character overview of the business lines
Market position: a 100-character overview of market share and standing
Financial data: a 100-character overview of revenue and earnings
";

/// Condensation instruction, sent ahead of each chunk of the aggregate report.
pub const SUMMARY_PROMPT: &str = "\
From the following content, write a summary for each company. Keep each company's summary \
separate and no longer than 400 characters, strictly in this format:
Company 1 name
Company 1 main business: a 100-character overview of the business lines
Company 1 market position: a 100-character overview of market share and standing
Company 1 financial data: a 100-character overview of revenue and earnings
Do not introduce any information that is not present in the input.";

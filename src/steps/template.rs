//! The content-plan pipeline every generation run follows.

use super::{Step, StepIcon, Substep};

/// Fresh copy of the content-plan pipeline, every unit `pending`.
pub fn content_plan_pipeline() -> Vec<Step> {
    vec![
        Step::new(
            "analysis",
            "Business Analysis & Research",
            "Analyzing your business information, target audience, and competitive landscape",
        )
        .with_estimate("2-3 minutes")
        .with_icon(StepIcon::Brain)
        .with_substeps(vec![
            Substep::new("business-info", "Processing business information")
                .with_estimate("30 seconds")
                .with_details("Analyzing company profile and target audience"),
            Substep::new("competitor-analysis", "Competitive landscape analysis")
                .with_estimate("1-2 minutes")
                .with_details("Scanning competitor websites and strategies"),
            Substep::new("market-research", "Market trend research")
                .with_estimate("45 seconds")
                .with_details("Identifying current market trends and opportunities"),
        ]),
        Step::new(
            "keyword-research",
            "Keyword & SEO Research",
            "Researching primary and secondary keywords, analyzing search volumes and competition",
        )
        .with_estimate("3-4 minutes")
        .with_icon(StepIcon::Search)
        .with_substeps(vec![
            Substep::new("primary-keywords", "Primary keyword analysis")
                .with_estimate("1 minute")
                .with_details("Analyzing search volume and competition for primary keywords"),
            Substep::new("secondary-keywords", "Secondary keyword research")
                .with_estimate("1 minute")
                .with_details("Finding related keywords and long-tail opportunities"),
            Substep::new("competitor-keywords", "Competitor keyword analysis")
                .with_estimate("1-2 minutes")
                .with_details("Identifying keywords competitors are ranking for"),
        ]),
        Step::new(
            "content-strategy",
            "Content Strategy Development",
            "Creating comprehensive content strategy and calendar framework",
        )
        .with_estimate("2-3 minutes")
        .with_icon(StepIcon::TrendingUp)
        .with_substeps(vec![
            Substep::new("content-pillars", "Defining content pillars")
                .with_estimate("1 minute")
                .with_details("Establishing key themes and topics for your content"),
            Substep::new("platform-strategy", "Platform-specific strategies")
                .with_estimate("1-2 minutes")
                .with_details("Optimizing content approach for each social platform"),
        ]),
        Step::new(
            "calendar-generation",
            "Content Calendar Creation",
            "Generating 30-day content calendar with optimal posting schedule",
        )
        .with_estimate("1-2 minutes")
        .with_icon(StepIcon::Calendar)
        .with_substeps(vec![
            Substep::new("calendar-structure", "Building calendar framework")
                .with_estimate("30 seconds")
                .with_details("Creating posting schedule and content mix"),
            Substep::new("optimal-timing", "Optimizing posting times")
                .with_estimate("45 seconds")
                .with_details("Analyzing best times to post for your audience"),
        ]),
        Step::new(
            "content-creation",
            "Content Generation",
            "Creating engaging posts, articles, and copy for all platforms",
        )
        .with_estimate("5-7 minutes")
        .with_icon(StepIcon::FileText)
        .with_substeps(vec![
            Substep::new("social-posts", "Social media posts")
                .with_estimate("2-3 minutes")
                .with_details("Generating Instagram, Twitter, LinkedIn, and Facebook posts"),
            Substep::new("blog-articles", "Blog articles")
                .with_estimate("2-3 minutes")
                .with_details("Creating in-depth blog content and articles"),
            Substep::new("video-scripts", "Video scripts")
                .with_estimate("1-2 minutes")
                .with_details("Writing scripts for YouTube and social video content"),
        ]),
        Step::new(
            "media-generation",
            "Visual Content Creation",
            "Generating images, graphics, and visual elements for your content",
        )
        .with_estimate("3-4 minutes")
        .with_icon(StepIcon::Image)
        .with_substeps(vec![
            Substep::new("social-graphics", "Social media graphics")
                .with_estimate("1-2 minutes")
                .with_details("Creating post graphics and story templates"),
            Substep::new("blog-images", "Blog featured images")
                .with_estimate("1 minute")
                .with_details("Generating hero images for blog articles"),
            Substep::new("video-thumbnails", "Video thumbnails")
                .with_estimate("1 minute")
                .with_details("Creating eye-catching video thumbnails"),
        ]),
        Step::new(
            "optimization",
            "Content Optimization",
            "Optimizing content for SEO, engagement, and platform algorithms",
        )
        .with_estimate("2-3 minutes")
        .with_icon(StepIcon::Target)
        .with_substeps(vec![
            Substep::new("seo-optimization", "SEO optimization")
                .with_estimate("1-2 minutes")
                .with_details("Optimizing content for search engines and keywords"),
            Substep::new("engagement-optimization", "Engagement optimization")
                .with_estimate("1 minute")
                .with_details("Adding CTAs, hashtags, and engagement elements"),
        ]),
        Step::new(
            "finalization",
            "Final Review & Packaging",
            "Finalizing content plan and preparing for review",
        )
        .with_estimate("1 minute")
        .with_icon(StepIcon::Sparkles)
        .with_substeps(vec![
            Substep::new("quality-check", "Quality assurance")
                .with_estimate("30 seconds")
                .with_details("Final review of all generated content"),
            Substep::new("packaging", "Content packaging")
                .with_estimate("30 seconds")
                .with_details("Organizing content for easy review and scheduling"),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::steps::{publications_for, StepStatus};

    #[test]
    fn test_pipeline_shape() {
        let steps = content_plan_pipeline();
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "analysis",
                "keyword-research",
                "content-strategy",
                "calendar-generation",
                "content-creation",
                "media-generation",
                "optimization",
                "finalization",
            ]
        );
        let counts: Vec<usize> = steps.iter().map(|s| s.substeps.len()).collect();
        assert_eq!(counts, [3, 3, 2, 2, 3, 3, 2, 2]);
        assert_eq!(publications_for(&steps), 58);
    }

    #[test]
    fn test_pipeline_starts_pending_without_timestamps() {
        for step in content_plan_pipeline() {
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.started_at.is_none() && step.completed_at.is_none());
            assert!(step.icon.is_some());
            for sub in &step.substeps {
                assert_eq!(sub.status, StepStatus::Pending);
                assert!(sub.completed_at.is_none());
            }
        }
    }

    #[test]
    fn test_ids_unique() {
        let steps = content_plan_pipeline();
        let step_ids: HashSet<_> = steps.iter().map(|s| &s.id).collect();
        assert_eq!(step_ids.len(), steps.len());
        for step in &steps {
            let sub_ids: HashSet<_> = step.substeps.iter().map(|s| &s.id).collect();
            assert_eq!(sub_ids.len(), step.substeps.len());
        }
    }

    #[test]
    fn test_each_call_is_a_fresh_copy() {
        let mut first = content_plan_pipeline();
        first[0].begin(chrono::Utc::now()).unwrap();
        let second = content_plan_pipeline();
        assert_eq!(second[0].status, StepStatus::Pending);
    }
}
